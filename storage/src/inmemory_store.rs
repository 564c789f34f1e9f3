//! In-memory [`ConversationStore`]: no database, state lives for the process lifetime.
//!
//! Used by tests and by the CLI when no database is wanted. Turns keep insertion order per conversation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infobot_core::{
    Category, Conversation, InformationItem, Role, StoredInformationItem, Turn,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StorageError;
use crate::store::ConversationStore;

#[derive(Default)]
struct State {
    conversations: HashMap<String, Conversation>,
    turns: HashMap<String, Vec<Turn>>,
    items: Vec<StoredInformationItem>,
}

#[derive(Default)]
pub struct InMemoryConversationStore {
    state: RwLock<State>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns stored for a conversation (all of them, not only the recent window).
    pub async fn turn_count(&self, conversation_id: &str) -> usize {
        let state = self.state.read().await;
        state.turns.get(conversation_id).map_or(0, Vec::len)
    }
}

fn not_found(conversation_id: &str) -> StorageError {
    StorageError::NotFound(format!("conversation {}", conversation_id))
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        user_id: i64,
        title: &str,
    ) -> Result<Conversation, StorageError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            user_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state
            .conversations
            .insert(conversation.id.clone(), conversation.clone());
        state.turns.insert(conversation.id.clone(), Vec::new());
        Ok(conversation)
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StorageError> {
        let state = self.state.read().await;
        Ok(state.conversations.get(conversation_id).cloned())
    }

    async fn list_conversations(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Conversation>, StorageError> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| since.map_or(true, |cutoff| c.created_at >= cutoff))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn rename_conversation(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| not_found(conversation_id))?;
        conversation.title = title.to_string();
        Ok(())
    }

    async fn get_recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StorageError> {
        let state = self.state.read().await;
        let turns = state.turns.get(conversation_id).map_or(&[][..], Vec::as_slice);
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }

    async fn append_turn(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Turn, StorageError> {
        let mut state = self.state.write().await;
        if !state.conversations.contains_key(conversation_id) {
            return Err(not_found(conversation_id));
        }
        let turn = Turn {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state
            .turns
            .entry(conversation_id.to_string())
            .or_default()
            .push(turn.clone());
        Ok(turn)
    }

    async fn append_information_items(
        &self,
        user_id: i64,
        conversation_id: Option<&str>,
        items: &[InformationItem],
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        let mut state = self.state.write().await;
        if let Some(conv_id) = conversation_id {
            if !state.conversations.contains_key(conv_id) {
                return Err(not_found(conv_id));
            }
        }
        let stored: Vec<StoredInformationItem> = items
            .iter()
            .map(|item| StoredInformationItem {
                id: Uuid::new_v4().to_string(),
                user_id,
                conversation_id: conversation_id.map(str::to_string),
                item: item.clone(),
                created_at: Utc::now(),
            })
            .collect();
        state.items.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn get_information_item(
        &self,
        user_id: i64,
        item_id: &str,
    ) -> Result<Option<StoredInformationItem>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .find(|i| i.id == item_id && i.user_id == user_id)
            .cloned())
    }

    async fn list_information_items(
        &self,
        user_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .filter(|i| category.map_or(true, |c| i.item.category == c))
            .cloned()
            .collect())
    }

    async fn list_conversation_items(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|i| i.conversation_id.as_deref() == Some(conversation_id))
            .cloned()
            .collect())
    }

    async fn touch_conversation(&self, conversation_id: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(conversation_id)
            .ok_or_else(|| not_found(conversation_id))?;
        conversation.updated_at = Utc::now();
        Ok(())
    }
}
