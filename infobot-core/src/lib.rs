//! # infobot-core
//!
//! Core types shared by every crate in the workspace: conversation [`Turn`]s, [`Conversation`]s,
//! categorized [`InformationItem`]s and the [`ContentSource`] that feeds extraction, plus error types
//! and tracing initialization. No I/O besides the log file opened by [`init_tracing`].

pub mod error;
pub mod logger;
pub mod types;

pub use error::{InvalidCategory, InvalidRole};
pub use logger::init_tracing;
pub use types::{
    Category, ContentSource, ContentType, Conversation, InformationItem, Role,
    StoredInformationItem, Turn, DEFAULT_CONVERSATION_TITLE,
};
