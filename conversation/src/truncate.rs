//! Character-bounded copies of user text for prompts and titles.

use std::borrow::Cow;

/// Marker appended to a prompt copy that was cut.
pub const DEFAULT_TRUNCATION_MARKER: &str = "…(内容过长，已截断)";

/// Keeps at most `max_chars` characters; when cut, `marker` is appended after them.
pub fn display_bounded<'a>(text: &'a str, max_chars: usize, marker: &str) -> Cow<'a, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], marker)),
    }
}
