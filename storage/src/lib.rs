//! Storage crate: persistence of conversations, turns and information items.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – Row types (ConversationRecord, TurnRecord, ItemRecord)
//! - [`store`] – ConversationStore trait
//! - [`conversation_repo`] – SqliteConversationStore (SQLite)
//! - [`inmemory_store`] – InMemoryConversationStore
//! - [`sqlite_pool`] – SqlitePoolManager

mod conversation_repo;
mod error;
mod inmemory_store;
mod models;
mod sqlite_pool;
mod store;

pub use conversation_repo::SqliteConversationStore;
pub use error::StorageError;
pub use inmemory_store::InMemoryConversationStore;
pub use models::{ConversationRecord, ItemRecord, TurnRecord};
pub use sqlite_pool::SqlitePoolManager;
pub use store::ConversationStore;
