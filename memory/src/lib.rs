//! # Memory Crate
//!
//! Builds the bounded conversation window that is fed to the model on every reply.
//!
//! ## Features
//!
//! - **Suffix window**: keeps the most recent turns, capped by count and by estimated length
//! - **Pluggable estimator**: character count, approximate tokens, or any [`LengthEstimator`]
//! - **Pure**: no I/O; the caller fetches turns from the store
//!
//! ## Quick Start
//!
//! ```rust
//! use memory::ContextBuilder;
//!
//! let builder = ContextBuilder::new().with_max_turns(20).with_budget(1000);
//! let context = builder.build(&[]);
//! assert!(context.is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`context`] - ContextBuilder, ConversationContext and estimators

pub mod context;

pub use context::{
    ApproxTokenEstimator, CharCountEstimator, ContextBuilder, ConversationContext,
    LengthEstimator, DEFAULT_BUDGET, DEFAULT_MAX_TURNS,
};
