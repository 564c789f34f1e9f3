//! One message-handling cycle:
//! `RECEIVED → CONTEXT_BUILT → INTENT_CHECKED → {EXTRACT_AND_CONFIRM | GENERATE_REPLY}
//! → SAVABLE_CHECKED → PERSISTED → DONE`.
//!
//! Capability failures degrade to fixed replies; only persistence failures (and cancellation)
//! abort a cycle.

use extraction::{ExtractionEngine, SavableInfoDetector};
use infobot_core::{ContentSource, Role, StoredInformationItem, Turn};
use llm_client::LlmClient;
use memory::{ContextBuilder, ConversationContext};
use prompt::{ChatMessage, APOLOGY_REPLY, DEFAULT_SYSTEM_PERSONA, SAVE_CONFIRMATION, SAVE_PROMPT_SUFFIX};
use std::future::Future;
use std::sync::Arc;
use storage::{ConversationStore, StorageError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::intent::IntentDetector;
use crate::locks::ConversationLocks;
use crate::truncate::{display_bounded, DEFAULT_TRUNCATION_MARKER};

/// Characters kept from the first user message when it becomes the conversation title.
pub const TITLE_MAX_CHARS: usize = 30;
const TITLE_MARKER: &str = "...";

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("message content is empty")]
    EmptyContent,
    #[error("conversation {0} not found")]
    ConversationNotFound(String),
    #[error("conversation {0} belongs to another user")]
    NotOwner(String),
    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
    #[error("cycle cancelled before the reply was persisted")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Turns fetched from the store before budgeting.
    pub history_limit: usize,
    pub context_budget: usize,
    /// Context turns handed to extraction on a save directive.
    pub extraction_turns: usize,
    /// Cap on the user message copy used in prompts; the stored turn is never cut.
    pub max_prompt_chars: usize,
    pub truncation_marker: String,
    pub system_persona: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            history_limit: 20,
            context_budget: 1000,
            extraction_turns: 5,
            max_prompt_chars: 2000,
            truncation_marker: DEFAULT_TRUNCATION_MARKER.to_string(),
            system_persona: DEFAULT_SYSTEM_PERSONA.to_string(),
        }
    }
}

/// Which branch the cycle took.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleKind {
    /// Save directive: items extracted and stored, fixed confirmation returned.
    Saved { items: Vec<StoredInformationItem> },
    /// Conversational reply.
    Replied {
        /// The model failed and the apology was used.
        fell_back: bool,
        save_prompt_appended: bool,
    },
}

/// Both persisted turns of a completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub user_turn: Turn,
    pub assistant_turn: Turn,
    pub kind: CycleKind,
}

/// Drives message cycles over a store and a generative capability.
///
/// Cycles on the same conversation are serialized; cycles on different conversations run
/// concurrently.
pub struct ConversationOrchestrator {
    store: Arc<dyn ConversationStore>,
    llm: Arc<dyn LlmClient>,
    extraction: ExtractionEngine,
    savable: Arc<dyn SavableInfoDetector>,
    intent: IntentDetector,
    context_builder: ContextBuilder,
    settings: OrchestratorSettings,
    locks: ConversationLocks,
}

async fn or_cancel<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, CycleError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CycleError::Cancelled),
        output = fut => Ok(output),
    }
}

fn to_chat_message(turn: &Turn) -> ChatMessage {
    match turn.role {
        Role::User => ChatMessage::user(turn.content.as_str()),
        Role::Assistant => ChatMessage::assistant(turn.content.as_str()),
    }
}

fn transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| prompt::transcript_line(t.role.as_str(), &t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        llm: Arc<dyn LlmClient>,
        savable: Arc<dyn SavableInfoDetector>,
        settings: OrchestratorSettings,
    ) -> Self {
        let context_builder = ContextBuilder::new()
            .with_max_turns(settings.history_limit)
            .with_budget(settings.context_budget);
        Self {
            extraction: ExtractionEngine::new(llm.clone()),
            store,
            llm,
            savable,
            intent: IntentDetector::new(),
            context_builder,
            settings,
            locks: ConversationLocks::new(),
        }
    }

    pub fn with_intent_detector(mut self, intent: IntentDetector) -> Self {
        self.intent = intent;
        self
    }

    /// Replaces the builder (e.g. to use a token estimator); its turn cap and budget win.
    /// History is fetched for the larger of the builder's cap and `history_limit`.
    pub fn with_context_builder(mut self, context_builder: ContextBuilder) -> Self {
        self.context_builder = context_builder;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Handles one user message end to end.
    ///
    /// The user turn is persisted first; the assistant turn is written only after the reply is
    /// final and only if `cancel` has not fired. On a save cycle the items are written in one
    /// batch; once that batch is committed the confirmation is written even if `cancel` fires.
    #[instrument(skip(self, content, cancel), fields(content_len = content.len()))]
    pub async fn handle_message(
        &self,
        user_id: i64,
        conversation_id: &str,
        content: &str,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome, CycleError> {
        if content.trim().is_empty() {
            return Err(CycleError::EmptyContent);
        }

        let _guard = self.locks.acquire(conversation_id).await;

        // RECEIVED
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| CycleError::ConversationNotFound(conversation_id.to_string()))?;
        if conversation.user_id != user_id {
            return Err(CycleError::NotOwner(conversation_id.to_string()));
        }
        if cancel.is_cancelled() {
            return Err(CycleError::Cancelled);
        }

        let user_turn = self
            .store
            .append_turn(conversation_id, Role::User, content)
            .await?;
        if conversation.has_default_title() {
            let title = display_bounded(content.trim(), TITLE_MAX_CHARS, TITLE_MARKER);
            self.store.rename_conversation(conversation_id, &title).await?;
        }
        let prompt_copy = display_bounded(
            content,
            self.settings.max_prompt_chars,
            &self.settings.truncation_marker,
        );
        info!(turn_id = %user_turn.id, truncated = prompt_copy.len() != content.len(), "step: received");

        // CONTEXT_BUILT
        let context = self.build_context(conversation_id, &user_turn).await?;
        info!(
            context_turns = context.len(),
            estimated_length = context.estimated_length,
            "step: context built"
        );

        // INTENT_CHECKED
        let save_intent = self.intent.is_save_intent(content);
        info!(save_intent, "step: intent checked");

        let (reply, kind) = if save_intent {
            let items = self
                .extract_and_store(user_id, conversation_id, &context, cancel)
                .await?;
            (SAVE_CONFIRMATION.to_string(), CycleKind::Saved { items })
        } else {
            let (reply, fell_back) = self.generate_reply(&context, &prompt_copy, cancel).await?;

            // SAVABLE_CHECKED
            let save_prompt_appended = !fell_back
                && or_cancel(cancel, self.savable.detect(&prompt_copy, &reply)).await?;
            info!(save_prompt_appended, "step: savable checked");

            let reply = if save_prompt_appended {
                format!("{}{}", reply, SAVE_PROMPT_SUFFIX)
            } else {
                reply
            };
            (
                reply,
                CycleKind::Replied {
                    fell_back,
                    save_prompt_appended,
                },
            )
        };

        // PERSISTED
        let items_committed = matches!(kind, CycleKind::Saved { .. });
        if cancel.is_cancelled() {
            if !items_committed {
                warn!("Cycle cancelled, assistant turn not written");
                return Err(CycleError::Cancelled);
            }
            warn!("Cancelled after items were committed, writing the confirmation anyway");
        }
        let assistant_turn = self
            .store
            .append_turn(conversation_id, Role::Assistant, &reply)
            .await?;
        self.store.touch_conversation(conversation_id).await?;
        info!(turn_id = %assistant_turn.id, "step: persisted");

        info!("step: done");
        Ok(CycleOutcome {
            user_turn,
            assistant_turn,
            kind,
        })
    }

    /// History before the current user turn, trimmed to the window.
    async fn build_context(
        &self,
        conversation_id: &str,
        user_turn: &Turn,
    ) -> Result<ConversationContext, CycleError> {
        let limit = self
            .settings
            .history_limit
            .max(self.context_builder.max_turns());
        let mut history = self
            .store
            .get_recent_turns(conversation_id, limit + 1)
            .await?;
        if history.last().is_some_and(|t| t.id == user_turn.id) {
            history.pop();
        } else if history.len() > limit {
            history.remove(0);
        }
        Ok(self.context_builder.build(&history))
    }

    async fn extract_and_store(
        &self,
        user_id: i64,
        conversation_id: &str,
        context: &ConversationContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<StoredInformationItem>, CycleError> {
        let source = ContentSource::Text(transcript(context.tail(self.settings.extraction_turns)));
        let result = or_cancel(cancel, self.extraction.extract(&source)).await?;
        info!(
            item_count = result.items.len(),
            fallback = result.is_fallback(),
            "step: extracted"
        );

        // 最后一个取消点：之后条目整批提交，提交后本轮必须写出确认回复
        if cancel.is_cancelled() {
            return Err(CycleError::Cancelled);
        }
        let stored = self
            .store
            .append_information_items(user_id, Some(conversation_id), &result.items)
            .await?;
        info!(item_count = stored.len(), "step: items committed");
        Ok(stored)
    }

    /// Returns the reply and whether it is the apology fallback.
    async fn generate_reply(
        &self,
        context: &ConversationContext,
        prompt_copy: &str,
        cancel: &CancellationToken,
    ) -> Result<(String, bool), CycleError> {
        let messages = prompt::build_reply_messages(
            &self.settings.system_persona,
            context.turns.iter().map(to_chat_message),
            prompt_copy,
        );
        let result = or_cancel(cancel, self.llm.complete(messages)).await?;

        let (reply, fell_back) = match result {
            Ok(reply) if !reply.trim().is_empty() => (reply, false),
            Ok(_) => {
                warn!("Model returned a blank reply, using apology");
                (APOLOGY_REPLY.to_string(), true)
            }
            Err(e) => {
                warn!(error = %e, "Reply generation failed, using apology");
                (APOLOGY_REPLY.to_string(), true)
            }
        };
        info!(reply_len = reply.len(), fell_back, "step: reply generated");
        Ok((reply, fell_back))
    }
}
