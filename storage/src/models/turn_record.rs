//! Turn record model for persistence.
//!
//! Maps to the `turns` table. `seq` is assigned by SQLite and orders turns within a conversation.

use chrono::{DateTime, Utc};
use infobot_core::{Role, Turn};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TurnRecord {
    pub seq: i64,
    pub id: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TurnRecord> for Turn {
    type Error = StorageError;

    fn try_from(r: TurnRecord) -> Result<Self, Self::Error> {
        let role: Role = r
            .role
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("turn {}: {}", r.id, e)))?;
        Ok(Turn {
            id: r.id,
            conversation_id: r.conversation_id,
            role,
            content: r.content,
            created_at: r.created_at,
        })
    }
}
