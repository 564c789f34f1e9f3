//! # Extraction
//!
//! Turns a [`ContentSource`](infobot_core::ContentSource) into categorized
//! [`InformationItem`](infobot_core::InformationItem)s through the generative capability, and
//! decides whether a finished exchange is worth offering to save.
//!
//! ## Guarantees
//!
//! - [`ExtractionEngine::extract`] never fails and always returns at least one item
//! - Every returned item's category is a member of the closed taxonomy
//! - Savable detection is advisory: any failure reads as "not savable"
//!
//! ## External interactions
//!
//! - **LLM**: [`llm_client::LlmClient`] for text completion and vision completion

mod engine;
mod error;
mod parse;
mod savable;

pub use engine::{fallback_items, ExtractionEngine, ExtractionOutcome, ExtractionResult};
pub use error::{ExtractionError, ParseError, SavableCheckError};
pub use parse::{parse_items, strip_code_fence};
pub use savable::{KeywordSavableInfoDetector, LlmSavableInfoDetector, SavableInfoDetector};

/// Fallback title for text content.
pub const TEXT_FALLBACK_TITLE: &str = "原始文本";
/// Fallback title for image content.
pub const IMAGE_FALLBACK_TITLE: &str = "图片内容";
/// Fallback description for image content (the image itself has no text to echo back).
pub const IMAGE_FALLBACK_DESCRIPTION: &str = "从图片中提取的内容";
