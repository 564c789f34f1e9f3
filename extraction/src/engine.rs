//! ExtractionEngine: one entry point for text and image content, with a fallback that never fails.

use infobot_core::{Category, ContentSource, InformationItem};
use llm_client::LlmClient;
use prompt::{ChatMessage, EXTRACTION_SYSTEM_MESSAGE, IMAGE_EXTRACTION_PROMPT};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::ExtractionError;
use crate::parse::parse_items;
use crate::{IMAGE_FALLBACK_DESCRIPTION, IMAGE_FALLBACK_TITLE, TEXT_FALLBACK_TITLE};

/// Whether the items came from the model or from the fallback.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Extracted,
    Fallback(ExtractionError),
}

/// Non-empty list of items plus how they were obtained (observability only).
#[derive(Debug)]
pub struct ExtractionResult {
    pub items: Vec<InformationItem>,
    pub outcome: ExtractionOutcome,
}

impl ExtractionResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Fallback(_))
    }

    pub fn into_items(self) -> Vec<InformationItem> {
        self.items
    }
}

/// Single-item fallback for `source`: the original text, or a generic label for images.
pub fn fallback_items(source: &ContentSource) -> Vec<InformationItem> {
    let (title, description) = match source {
        ContentSource::Text(text) => (TEXT_FALLBACK_TITLE, text.as_str()),
        ContentSource::Image(_) => (IMAGE_FALLBACK_TITLE, IMAGE_FALLBACK_DESCRIPTION),
    };
    vec![InformationItem {
        title: title.to_string(),
        description: description.to_string(),
        category: Category::Temporary,
        source_content: source.source_content().to_string(),
        content_type: source.content_type(),
    }]
}

/// Extracts categorized items through the generative capability.
///
/// Bound the client with [`llm_client::WithTimeout`]; a timeout is handled like any other
/// call failure.
#[derive(Clone)]
pub struct ExtractionEngine {
    llm: Arc<dyn LlmClient>,
}

impl ExtractionEngine {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// One extraction attempt; every failure is returned as a typed error.
    pub async fn try_extract(
        &self,
        source: &ContentSource,
    ) -> Result<Vec<InformationItem>, ExtractionError> {
        if source.source_content().trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let raw = match source {
            ContentSource::Text(text) => {
                let messages = vec![
                    ChatMessage::system(EXTRACTION_SYSTEM_MESSAGE),
                    ChatMessage::user(prompt::text_extraction_prompt(text)),
                ];
                self.llm.complete(messages).await?
            }
            ContentSource::Image(reference) => {
                self.llm
                    .complete_with_image(IMAGE_EXTRACTION_PROMPT, reference)
                    .await?
            }
        };

        Ok(parse_items(&raw, source)?)
    }

    /// Always returns at least one item with a taxonomy category.
    #[instrument(skip(self, source), fields(content_type = %source.content_type()))]
    pub async fn extract(&self, source: &ContentSource) -> ExtractionResult {
        match self.try_extract(source).await {
            Ok(items) => {
                info!(item_count = items.len(), "Extraction succeeded");
                ExtractionResult {
                    items,
                    outcome: ExtractionOutcome::Extracted,
                }
            }
            Err(e) => {
                warn!(error = %e, "Extraction failed, using fallback item");
                ExtractionResult {
                    items: fallback_items(source),
                    outcome: ExtractionOutcome::Fallback(e),
                }
            }
        }
    }
}
