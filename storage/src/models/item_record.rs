//! Information item record model for persistence.
//!
//! Maps to the `information_items` table.

use chrono::{DateTime, Utc};
use infobot_core::{Category, ContentType, InformationItem, StoredInformationItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemRecord {
    pub id: String,
    pub user_id: i64,
    pub conversation_id: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub source_content: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl ItemRecord {
    /// Creates a new record with a generated UUID and current timestamp.
    pub fn new(user_id: i64, conversation_id: Option<String>, item: &InformationItem) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            conversation_id,
            title: item.title.clone(),
            description: item.description.clone(),
            category: item.category.as_str().to_string(),
            source_content: item.source_content.clone(),
            content_type: item.content_type.as_str().to_string(),
            created_at: Utc::now(),
        }
    }
}

impl TryFrom<ItemRecord> for StoredInformationItem {
    type Error = StorageError;

    fn try_from(r: ItemRecord) -> Result<Self, Self::Error> {
        let category: Category = r
            .category
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("item {}: {}", r.id, e)))?;
        let content_type: ContentType = r
            .content_type
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("item {}: {}", r.id, e)))?;
        Ok(StoredInformationItem {
            id: r.id,
            user_id: r.user_id,
            conversation_id: r.conversation_id,
            item: InformationItem {
                title: r.title,
                description: r.description,
                category,
                source_content: r.source_content,
                content_type,
            },
            created_at: r.created_at,
        })
    }
}
