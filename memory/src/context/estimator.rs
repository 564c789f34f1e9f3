//! Length estimators for context budgeting.
//!
//! Neither is a real tokenizer; both count characters (not bytes), so CJK text is not
//! over-counted the way a byte length would be.

/// Estimates the size of a text in an abstract length unit.
pub trait LengthEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// One unit per character.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCountEstimator;

impl LengthEstimator for CharCountEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Rough token count: 1 token ≈ `chars_per_token` characters, rounded up, minimum 1.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTokenEstimator {
    chars_per_token: usize,
}

impl ApproxTokenEstimator {
    /// `chars_per_token` of 0 is treated as 1.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for ApproxTokenEstimator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl LengthEstimator for ApproxTokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        let chars = text.chars().count();
        chars.div_ceil(self.chars_per_token).max(1)
    }
}
