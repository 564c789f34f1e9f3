//! # Context Builder
//!
//! Trims a conversation's chronological turn history to a window that fits the model call.
//!
//! ## Algorithm
//!
//! 1. Take the most recent `max_turns` turns.
//! 2. Estimate each turn with the configured [`LengthEstimator`].
//! 3. Drop from the oldest end while the total exceeds `budget`, never dropping the last turn.
//!
//! The result is always a contiguous suffix of the input, non-empty when the input is non-empty.

mod builder;
mod estimator;
mod types;

pub use builder::{ContextBuilder, DEFAULT_BUDGET, DEFAULT_MAX_TURNS};
pub use estimator::{ApproxTokenEstimator, CharCountEstimator, LengthEstimator};
pub use types::ConversationContext;
