use anyhow::{bail, Context, Result};
use conversation::OrchestratorSettings;
use std::env;
use std::str::FromStr;

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Sqlite,
    Memory,
}

/// 回复后“是否值得保存”的判断方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavableDetectorKind {
    Llm,
    Keyword,
}

/// 应用配置，从环境变量加载（LLM 配置见 `llm_client::LlmConfig`）
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub store_type: StoreType,
    pub log_file: Option<String>,
    pub history_limit: usize,
    pub context_budget: usize,
    pub extraction_turns: usize,
    pub max_prompt_chars: usize,
    pub savable_detector: SavableDetectorKind,
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid {}: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let defaults = OrchestratorSettings::default();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/infobot.db".to_string());
        let store_type = match env::var("STORE_TYPE").as_deref() {
            Err(_) | Ok("sqlite") => StoreType::Sqlite,
            Ok("memory") => StoreType::Memory,
            Ok(other) => bail!("Invalid STORE_TYPE: {} (expected sqlite or memory)", other),
        };
        let log_file = env::var("LOG_FILE").ok().filter(|s| !s.trim().is_empty());
        let savable_detector = match env::var("SAVABLE_DETECTOR").as_deref() {
            Err(_) | Ok("llm") => SavableDetectorKind::Llm,
            Ok("keyword") => SavableDetectorKind::Keyword,
            Ok(other) => bail!("Invalid SAVABLE_DETECTOR: {} (expected llm or keyword)", other),
        };

        Ok(Self {
            database_url,
            store_type,
            log_file,
            history_limit: parse_var("CONTEXT_HISTORY_LIMIT", defaults.history_limit)?,
            context_budget: parse_var("CONTEXT_BUDGET", defaults.context_budget)?,
            extraction_turns: parse_var("EXTRACTION_TURNS", defaults.extraction_turns)?,
            max_prompt_chars: parse_var("MAX_PROMPT_CHARS", defaults.max_prompt_chars)?,
            savable_detector,
        })
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            history_limit: self.history_limit,
            context_budget: self.context_budget,
            extraction_turns: self.extraction_turns,
            max_prompt_chars: self.max_prompt_chars,
            ..OrchestratorSettings::default()
        }
    }

    /// Filesystem path of a file-backed SQLite URL, if any.
    pub fn sqlite_file_path(&self) -> Option<&str> {
        if self.store_type != StoreType::Sqlite || self.database_url.contains(":memory:") {
            return None;
        }
        let path = self.database_url.strip_prefix("sqlite:")?;
        let path = path.strip_prefix("//").unwrap_or(path);
        Some(path.split('?').next().unwrap_or(path))
    }
}
