//! Bounded-time decorator for any [`LlmClient`].

use async_trait::async_trait;
use prompt::ChatMessage;
use std::time::Duration;
use tracing::warn;

use crate::{LlmClient, LlmError};

/// Wraps a client so that every call fails with [`LlmError::Timeout`] once `timeout` elapses.
#[derive(Debug, Clone)]
pub struct WithTimeout<C> {
    inner: C,
    timeout: Duration,
}

impl<C> WithTimeout<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for WithTimeout<C> {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(messages)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "LLM completion timed out");
                Err(LlmError::Timeout(self.timeout))
            }
        }
    }

    async fn complete_with_image(&self, prompt: &str, image_ref: &str) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.complete_with_image(prompt, image_ref))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs_f64(), "LLM vision completion timed out");
                Err(LlmError::Timeout(self.timeout))
            }
        }
    }
}
