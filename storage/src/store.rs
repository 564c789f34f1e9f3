//! Persistence interface consumed by the conversation pipeline.
//!
//! Implementations: [`crate::SqliteConversationStore`] (SQLite) and [`crate::InMemoryConversationStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infobot_core::{
    Category, Conversation, InformationItem, Role, StoredInformationItem, Turn,
};

use crate::error::StorageError;

/// Store for conversations, their turns, and extracted information items.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates a conversation owned by `user_id`.
    async fn create_conversation(
        &self,
        user_id: i64,
        title: &str,
    ) -> Result<Conversation, StorageError>;

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StorageError>;

    /// Conversations of a user, most recently active first. `since` filters on creation time.
    async fn list_conversations(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Conversation>, StorageError>;

    async fn rename_conversation(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), StorageError>;

    /// Up to `limit` most recent turns, returned oldest first.
    async fn get_recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StorageError>;

    async fn append_turn(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Turn, StorageError>;

    /// Stores all of `items` or none of them.
    async fn append_information_items(
        &self,
        user_id: i64,
        conversation_id: Option<&str>,
        items: &[InformationItem],
    ) -> Result<Vec<StoredInformationItem>, StorageError>;

    async fn append_information_item(
        &self,
        user_id: i64,
        conversation_id: Option<&str>,
        item: &InformationItem,
    ) -> Result<StoredInformationItem, StorageError> {
        self.append_information_items(user_id, conversation_id, std::slice::from_ref(item))
            .await?
            .pop()
            .ok_or_else(|| StorageError::Database("item insert returned no row".to_string()))
    }

    /// One item, only if it belongs to `user_id`.
    async fn get_information_item(
        &self,
        user_id: i64,
        item_id: &str,
    ) -> Result<Option<StoredInformationItem>, StorageError>;

    /// Items of a user, newest first, optionally restricted to one category.
    async fn list_information_items(
        &self,
        user_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<StoredInformationItem>, StorageError>;

    /// Items linked to one conversation, oldest first.
    async fn list_conversation_items(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<StoredInformationItem>, StorageError>;

    /// Sets the conversation's last-activity timestamp to now.
    async fn touch_conversation(&self, conversation_id: &str) -> Result<(), StorageError>;
}
