//! OpenAI 兼容实现的 LlmClient：包装 openai-client，文本模型与视觉模型分开配置。

use async_trait::async_trait;
use openai_client::{CompletionOptions, OpenAIClient};
use prompt::ChatMessage;
use tracing::instrument;

use super::{chat_message_to_openai, LlmClient, LlmError};
use crate::config::LlmConfig;
use crate::image::resolve_image_url;

/// 默认文本模型。
pub const DEFAULT_MODEL: &str = "qwen-plus";
/// 默认视觉（OCR）模型。
pub const DEFAULT_VISION_MODEL: &str = "qwen-vl-ocr";

/// OCR 调用参数：需要更多 token。
const VISION_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: Some(0.7),
    top_p: Some(0.8),
    max_tokens: Some(1500),
};

/// 基于 openai-client 的 LlmClient 实现。
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: OpenAIClient,
    model: String,
    vision_model: String,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: OpenAIClient::new(api_key),
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: OpenAIClient::with_base_url(api_key, base_url),
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
        }
    }

    /// API key 通过配置显式传入，不读取全局状态。
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::with_base_url(config.api_key.clone(), config.base_url.clone())
            .with_model(config.model.clone())
            .with_vision_model(config.vision_model.clone())
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_vision_model(mut self, model: String) -> Self {
        self.vision_model = model;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }
}

fn non_empty(reply: String) -> Result<String, LlmError> {
    if reply.trim().is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(reply)
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages), fields(model = %self.model, message_count = messages.len()))]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let openai_messages = messages
            .iter()
            .map(chat_message_to_openai)
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let reply = self
            .client
            .chat_completion(&self.model, openai_messages, CompletionOptions::default())
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;
        non_empty(reply)
    }

    #[instrument(skip(self, prompt), fields(model = %self.vision_model))]
    async fn complete_with_image(&self, prompt: &str, image_ref: &str) -> Result<String, LlmError> {
        let image_url = resolve_image_url(image_ref).await?;

        let reply = self
            .client
            .vision_completion(&self.vision_model, prompt, &image_url, VISION_OPTIONS)
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;
        non_empty(reply)
    }
}
