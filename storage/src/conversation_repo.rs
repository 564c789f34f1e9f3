//! Conversation repository: SQLite persistence for conversations, turns and information items.
//!
//! Uses SqlitePoolManager and the row models (ConversationRecord, TurnRecord, ItemRecord).
//! External: SQLite via sqlx; callers go through the [`ConversationStore`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infobot_core::{
    Category, Conversation, InformationItem, Role, StoredInformationItem, Turn,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{ConversationRecord, ItemRecord, TurnRecord};
use crate::sqlite_pool::SqlitePoolManager;
use crate::store::ConversationStore;

#[derive(Clone)]
pub struct SqliteConversationStore {
    pool_manager: SqlitePoolManager,
}

impl SqliteConversationStore {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let store = Self { pool_manager };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                conversation_id TEXT NOT NULL REFERENCES conversations(id),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS information_items (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                conversation_id TEXT REFERENCES conversations(id),
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'temporary',
                source_content TEXT NOT NULL,
                content_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_conversations_user_id ON conversations(user_id);
            CREATE INDEX IF NOT EXISTS idx_turns_conversation_id ON turns(conversation_id);
            CREATE INDEX IF NOT EXISTS idx_items_user_id ON information_items(user_id);
            CREATE INDEX IF NOT EXISTS idx_items_category ON information_items(category);
            CREATE INDEX IF NOT EXISTS idx_items_conversation_id ON information_items(conversation_id);
            "#,
        )
        .execute(pool)
        .await?;

        info!("Database tables created successfully");
        Ok(())
    }

    async fn ensure_conversation(&self, conversation_id: &str) -> Result<(), StorageError> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        match exists {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!(
                "conversation {}",
                conversation_id
            ))),
        }
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    #[instrument(skip(self))]
    async fn create_conversation(
        &self,
        user_id: i64,
        title: &str,
    ) -> Result<Conversation, StorageError> {
        let record = ConversationRecord::new(user_id, title.to_string());

        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(conversation_id = %record.id, user_id, "Created conversation");
        Ok(record.into())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StorageError> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            "SELECT * FROM conversations WHERE id = ?",
        )
        .bind(conversation_id)
        .fetch_optional(self.pool_manager.pool())
        .await?;

        Ok(record.map(Into::into))
    }

    async fn list_conversations(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Conversation>, StorageError> {
        let pool = self.pool_manager.pool();
        let records: Vec<ConversationRecord> = match since {
            Some(cutoff) => {
                sqlx::query_as(
                    "SELECT * FROM conversations WHERE user_id = ? AND created_at >= ? ORDER BY updated_at DESC, rowid DESC",
                )
                .bind(user_id)
                .bind(cutoff)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT * FROM conversations WHERE user_id = ? ORDER BY updated_at DESC, rowid DESC",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        debug!("Retrieved {} conversations for user {}", records.len(), user_id);
        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn rename_conversation(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE conversations SET title = ? WHERE id = ?")
            .bind(title)
            .bind(conversation_id)
            .execute(self.pool_manager.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "conversation {}",
                conversation_id
            )));
        }
        Ok(())
    }

    async fn get_recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StorageError> {
        let records: Vec<TurnRecord> = sqlx::query_as::<_, TurnRecord>(
            "SELECT * FROM turns WHERE conversation_id = ? ORDER BY seq DESC LIMIT ?",
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(self.pool_manager.pool())
        .await?;

        debug!(
            "Retrieved {} recent turns for conversation {}",
            records.len(),
            conversation_id
        );

        records
            .into_iter()
            .rev()
            .map(Turn::try_from)
            .collect()
    }

    #[instrument(skip(self, content), fields(content_len = content.len()))]
    async fn append_turn(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Turn, StorageError> {
        self.ensure_conversation(conversation_id).await?;

        let turn = Turn {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO turns (id, conversation_id, role, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&turn.id)
        .bind(&turn.conversation_id)
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(turn.created_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(turn_id = %turn.id, role = %turn.role, "Saved turn");
        Ok(turn)
    }

    #[instrument(skip(self, items), fields(item_count = items.len()))]
    async fn append_information_items(
        &self,
        user_id: i64,
        conversation_id: Option<&str>,
        items: &[InformationItem],
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        if let Some(conv_id) = conversation_id {
            self.ensure_conversation(conv_id).await?;
        }

        let records: Vec<ItemRecord> = items
            .iter()
            .map(|item| ItemRecord::new(user_id, conversation_id.map(str::to_string), item))
            .collect();

        // 一次事务：要么全部写入，要么一条都不写
        let mut tx = self.pool_manager.pool().begin().await?;
        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO information_items
                    (id, user_id, conversation_id, title, description, category, source_content, content_type, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.id)
            .bind(record.user_id)
            .bind(&record.conversation_id)
            .bind(&record.title)
            .bind(&record.description)
            .bind(&record.category)
            .bind(&record.source_content)
            .bind(&record.content_type)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(user_id, item_count = records.len(), "Saved information items");
        records
            .into_iter()
            .map(StoredInformationItem::try_from)
            .collect()
    }

    async fn get_information_item(
        &self,
        user_id: i64,
        item_id: &str,
    ) -> Result<Option<StoredInformationItem>, StorageError> {
        let record = sqlx::query_as::<_, ItemRecord>(
            "SELECT * FROM information_items WHERE id = ? AND user_id = ?",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool_manager.pool())
        .await?;

        record.map(StoredInformationItem::try_from).transpose()
    }

    async fn list_information_items(
        &self,
        user_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        let pool = self.pool_manager.pool();
        let records: Vec<ItemRecord> = match category {
            Some(category) => {
                sqlx::query_as(
                    "SELECT * FROM information_items WHERE user_id = ? AND category = ? ORDER BY created_at DESC, rowid DESC",
                )
                .bind(user_id)
                .bind(category.as_str())
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT * FROM information_items WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
                )
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        records
            .into_iter()
            .map(StoredInformationItem::try_from)
            .collect()
    }

    async fn list_conversation_items(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        let records: Vec<ItemRecord> = sqlx::query_as(
            "SELECT * FROM information_items WHERE conversation_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(conversation_id)
        .fetch_all(self.pool_manager.pool())
        .await?;

        records
            .into_iter()
            .map(StoredInformationItem::try_from)
            .collect()
    }

    async fn touch_conversation(&self, conversation_id: &str) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(conversation_id)
            .execute(self.pool_manager.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "conversation {}",
                conversation_id
            )));
        }
        Ok(())
    }
}
