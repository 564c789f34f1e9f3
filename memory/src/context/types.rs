//! Context output type.

use infobot_core::Turn;

/// The window of turns sent to the model, with its estimated size.
///
/// Derived per request from the store's turn history; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    /// Chronological (oldest first).
    pub turns: Vec<Turn>,
    /// Sum of the estimator over `turns`.
    pub estimated_length: usize,
    /// Budget the window was built against.
    pub budget: usize,
}

impl ConversationContext {
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True only in the single-oversized-turn case.
    pub fn exceeds_budget(&self) -> bool {
        self.estimated_length > self.budget
    }

    /// The last `k` turns (all of them when `k >= len`).
    pub fn tail(&self, k: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(k);
        &self.turns[start..]
    }
}
