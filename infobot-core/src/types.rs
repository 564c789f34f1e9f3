//! Core types: turns, conversations, information items, categories and content sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{InvalidCategory, InvalidRole};

/// Title given to a conversation before its first user message replaces it.
pub const DEFAULT_CONVERSATION_TITLE: &str = "新对话";

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

/// One message within a conversation. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Ordered container of turns and derived information items belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_CONVERSATION_TITLE
    }
}

/// Closed category taxonomy. Serialized forms are case-sensitive and lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 临时杂项
    #[default]
    Temporary,
    /// 会议安排
    Meeting,
    /// 工作安排
    Work,
    /// 收入支出
    Finance,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Temporary,
        Category::Meeting,
        Category::Work,
        Category::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Temporary => "temporary",
            Category::Meeting => "meeting",
            Category::Work => "work",
            Category::Finance => "finance",
        }
    }

    /// Maps a possibly missing or invalid value onto the taxonomy; anything unknown becomes `Temporary`.
    pub fn coerce(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| InvalidCategory(s.to_string()))
    }
}

/// Kind of content an item was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentType::Text),
            "image" => Ok(ContentType::Image),
            other => Err(format!("Invalid content type: {}", other)),
        }
    }
}

/// Input to extraction: inline text or a reference (path or URL) to an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContentSource {
    Text(String),
    Image(String),
}

impl ContentSource {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentSource::Text(_) => ContentType::Text,
            ContentSource::Image(_) => ContentType::Image,
        }
    }

    /// The text itself, or the image reference.
    pub fn source_content(&self) -> &str {
        match self {
            ContentSource::Text(text) => text,
            ContentSource::Image(reference) => reference,
        }
    }
}

/// A structured, categorized fact extracted from conversation or uploaded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationItem {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub source_content: String,
    pub content_type: ContentType,
}

/// An [`InformationItem`] after the store accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInformationItem {
    pub id: String,
    pub user_id: i64,
    pub conversation_id: Option<String>,
    pub item: InformationItem,
    pub created_at: DateTime<Utc>,
}
