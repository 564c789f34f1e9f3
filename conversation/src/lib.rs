//! # Conversation
//!
//! The turn-by-turn pipeline: save-intent detection, the orchestrated message cycle and
//! upload ingestion.
//!
//! ## External interactions
//!
//! - **Store**: [`storage::ConversationStore`] for turns, titles, timestamps and items
//! - **LLM**: [`llm_client::LlmClient`] for replies, and through [`extraction`] for extraction
//!   and savable checks

mod intent;
mod locks;
mod orchestrator;
mod truncate;
mod upload;

pub use intent::{normalize, IntentDetector, DEFAULT_SAVE_DIRECTIVES};
pub use locks::ConversationLocks;
pub use orchestrator::{
    ConversationOrchestrator, CycleError, CycleKind, CycleOutcome, OrchestratorSettings,
    TITLE_MAX_CHARS,
};
pub use truncate::{display_bounded, DEFAULT_TRUNCATION_MARKER};
pub use upload::{classify_file, FileKind, UploadError, UploadProcessor};
