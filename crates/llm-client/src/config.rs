//! LLM configuration loaded from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::openai_llm::{DEFAULT_MODEL, DEFAULT_VISION_MODEL};

/// DashScope OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything needed to construct a client. The API key travels in this value, never through globals.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub vision_model: String,
    pub timeout: Duration,
}

/// Unset and blank values both count as missing.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl LlmConfig {
    /// Load from environment variables.
    ///
    /// Key: `LLM_API_KEY`, then `DASHSCOPE_API_KEY`, then `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = ["LLM_API_KEY", "DASHSCOPE_API_KEY", "OPENAI_API_KEY"]
            .into_iter()
            .filter_map(non_empty_var)
            .next()
            .context("LLM_API_KEY (or DASHSCOPE_API_KEY / OPENAI_API_KEY) not set")?;
        let base_url = env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let vision_model =
            env::var("LLM_VISION_MODEL").unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string());
        let timeout_secs = match env::var("LLM_TIMEOUT_SECS") {
            Ok(s) => s
                .trim()
                .parse::<u64>()
                .with_context(|| format!("LLM_TIMEOUT_SECS is not a number: {}", s))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be at least 1");
        }
        Ok(Self {
            api_key,
            base_url,
            model,
            vision_model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
