//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait (the generative capability), its typed [`LlmError`], an
//! OpenAI-compatible implementation and the [`WithTimeout`] decorator that bounds every call.
//! Used by the extraction and conversation crates; transport-agnostic.

use async_trait::async_trait;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use prompt::{ChatMessage, MessageRole};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod config;
mod image;
mod openai_llm;
mod timeout;

pub use config::LlmConfig;
pub use image::resolve_image_url;
pub use openai_llm::OpenAILlmClient;
pub use timeout::WithTimeout;

/// Failure of a call to the generative capability.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network, authentication, quota or API error reported by the endpoint.
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
    #[error("LLM returned an empty response")]
    EmptyResponse,
    /// The image reference could not be turned into something the endpoint accepts.
    #[error("Image reference unusable: {0}")]
    Image(String),
}

/// LLM client interface: chat-shaped completion and single-image vision completion.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the model reply text for the given messages, sent as-is (callers add the system message).
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError>;

    /// Returns the model reply for `prompt` about the image at `image_ref` (path or URL).
    async fn complete_with_image(&self, prompt: &str, image_ref: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        (**self).complete(messages).await
    }

    async fn complete_with_image(&self, prompt: &str, image_ref: &str) -> Result<String, LlmError> {
        (**self).complete_with_image(prompt, image_ref).await
    }
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> anyhow::Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}
