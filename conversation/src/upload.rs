//! Upload ingestion: inline text, text files and images become stored information items.

use extraction::ExtractionEngine;
use infobot_core::{ContentSource, StoredInformationItem};
use std::path::Path;
use std::sync::Arc;
use storage::{ConversationStore, StorageError};
use thiserror::Error;
use tracing::{info, instrument};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
const TEXT_EXTENSIONS: &[&str] = &["txt"];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("upload has no content")]
    EmptyContent,
    #[error("conversation {0} not found")]
    ConversationNotFound(String),
    #[error("conversation {0} belongs to another user")]
    NotOwner(String),
    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Maps a file path onto a content source by extension (case-insensitive).
pub fn classify_file(path: &Path) -> Result<FileKind, UploadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| UploadError::UnsupportedFileType(path.display().to_string()))?;
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(FileKind::Image)
    } else if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        Ok(FileKind::Text)
    } else {
        Err(UploadError::UnsupportedFileType(extension))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Image,
}

/// Runs extraction over uploaded content and stores every resulting item for the user.
#[derive(Clone)]
pub struct UploadProcessor {
    store: Arc<dyn ConversationStore>,
    extraction: ExtractionEngine,
}

impl UploadProcessor {
    pub fn new(store: Arc<dyn ConversationStore>, extraction: ExtractionEngine) -> Self {
        Self { store, extraction }
    }

    /// Capability failures never fail the upload; the fallback item is stored instead.
    #[instrument(skip(self, source), fields(content_type = %source.content_type()))]
    pub async fn process(
        &self,
        user_id: i64,
        conversation_id: Option<&str>,
        source: ContentSource,
    ) -> Result<Vec<StoredInformationItem>, UploadError> {
        if source.source_content().trim().is_empty() {
            return Err(UploadError::EmptyContent);
        }
        if let Some(id) = conversation_id {
            let conversation = self
                .store
                .get_conversation(id)
                .await?
                .ok_or_else(|| UploadError::ConversationNotFound(id.to_string()))?;
            if conversation.user_id != user_id {
                return Err(UploadError::NotOwner(id.to_string()));
            }
        }

        let result = self.extraction.extract(&source).await;
        let stored = self
            .store
            .append_information_items(user_id, conversation_id, &result.items)
            .await?;
        info!(
            item_count = stored.len(),
            fallback = result.is_fallback(),
            "Upload processed"
        );
        Ok(stored)
    }

    /// `.txt` files are read as text; images are passed by path.
    pub async fn process_file(
        &self,
        user_id: i64,
        conversation_id: Option<&str>,
        path: &Path,
    ) -> Result<Vec<StoredInformationItem>, UploadError> {
        let source = match classify_file(path)? {
            FileKind::Text => ContentSource::Text(tokio::fs::read_to_string(path).await?),
            FileKind::Image => {
                tokio::fs::metadata(path).await?;
                ContentSource::Image(path.display().to_string())
            }
        };
        self.process(user_id, conversation_id, source).await
    }
}
