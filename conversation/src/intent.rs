//! Save-intent detection: exact match of the normalized utterance against a directive set.

use std::collections::HashSet;

/// Directives recognized out of the box.
pub const DEFAULT_SAVE_DIRECTIVES: &[&str] = &[
    "保存",
    "是",
    "是的",
    "请保存",
    "帮我保存",
    "save",
    "yes",
    "please save",
];

/// Trims surrounding whitespace and lowercases.
pub fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

/// Pure classifier: true iff the normalized utterance is exactly one of the directives.
#[derive(Debug, Clone)]
pub struct IntentDetector {
    directives: HashSet<String>,
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::with_directives(DEFAULT_SAVE_DIRECTIVES.iter().copied())
    }
}

impl IntentDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directives are normalized the same way utterances are.
    pub fn with_directives<I, S>(directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            directives: directives
                .into_iter()
                .map(|d| normalize(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn is_save_intent(&self, utterance: &str) -> bool {
        self.directives.contains(&normalize(utterance))
    }
}
