//! Context builder: count cap, then budget trim from the oldest end.

use super::estimator::{CharCountEstimator, LengthEstimator};
use super::types::ConversationContext;
use infobot_core::Turn;
use std::sync::Arc;
use tracing::debug;

/// Default number of most recent turns considered.
pub const DEFAULT_MAX_TURNS: usize = 20;
/// Default budget in estimator units.
pub const DEFAULT_BUDGET: usize = 1000;

/// Builder for the bounded conversation window.
///
/// # Guarantees
///
/// - Output is a contiguous suffix of the input, in the original order
/// - Output is non-empty whenever the input is non-empty
/// - Output size ≤ `budget`, except when it is exactly the single most recent turn
#[derive(Clone)]
pub struct ContextBuilder {
    pub(crate) max_turns: usize,
    pub(crate) budget: usize,
    estimator: Arc<dyn LengthEstimator>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    /// `max_turns = 20`, `budget = 1000`, one unit per character.
    pub fn new() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            budget: DEFAULT_BUDGET,
            estimator: Arc::new(CharCountEstimator),
        }
    }

    /// Clamped to at least 1 so the most recent turn is always kept.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn LengthEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn estimate(&self, text: &str) -> usize {
        self.estimator.estimate(text)
    }

    /// Builds the window from a chronological history (oldest first).
    pub fn build(&self, history: &[Turn]) -> ConversationContext {
        let capped = &history[history.len().saturating_sub(self.max_turns)..];
        let sizes: Vec<usize> = capped
            .iter()
            .map(|t| self.estimator.estimate(&t.content))
            .collect();

        let mut total: usize = sizes.iter().sum();
        let mut start = 0;
        // 最后一条永远保留
        while total > self.budget && start + 1 < capped.len() {
            total -= sizes[start];
            start += 1;
        }

        debug!(
            history_len = history.len(),
            capped_len = capped.len(),
            kept = capped.len() - start,
            estimated_length = total,
            budget = self.budget,
            "Context window built"
        );

        ConversationContext {
            turns: capped[start..].to_vec(),
            estimated_length: total,
            budget: self.budget,
        }
    }
}
