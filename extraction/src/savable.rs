//! Savable-information detection: should the reply end with an offer to save?

use async_trait::async_trait;
use llm_client::LlmClient;
use prompt::{ChatMessage, SAVABLE_CHECK_SYSTEM_MESSAGE};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::SavableCheckError;

/// Advisory check over one user message and its reply.
#[async_trait]
pub trait SavableInfoDetector: Send + Sync {
    async fn check(&self, user_message: &str, reply: &str) -> Result<bool, SavableCheckError>;

    /// [`check`](Self::check) with every failure read as `false`.
    async fn detect(&self, user_message: &str, reply: &str) -> bool {
        match self.check(user_message, reply).await {
            Ok(savable) => savable,
            Err(e) => {
                warn!(error = %e, "Savable check failed, treating as not savable");
                false
            }
        }
    }
}

/// Asks the model for a bare YES / NO.
#[derive(Clone)]
pub struct LlmSavableInfoDetector {
    llm: Arc<dyn LlmClient>,
}

impl LlmSavableInfoDetector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

fn parse_verdict(raw: &str) -> Result<bool, SavableCheckError> {
    let normalized = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c == '。')
        .to_uppercase();
    match normalized.as_str() {
        "YES" | "是" => Ok(true),
        "NO" | "否" => Ok(false),
        _ => Err(SavableCheckError::UnrecognizedVerdict(raw.to_string())),
    }
}

#[async_trait]
impl SavableInfoDetector for LlmSavableInfoDetector {
    async fn check(&self, user_message: &str, reply: &str) -> Result<bool, SavableCheckError> {
        let messages = vec![
            ChatMessage::system(SAVABLE_CHECK_SYSTEM_MESSAGE),
            ChatMessage::user(prompt::savable_check_prompt(user_message, reply)),
        ];
        let raw = self.llm.complete(messages).await?;
        let verdict = parse_verdict(&raw)?;
        debug!(verdict, "Savable check answered");
        Ok(verdict)
    }
}

const SAVABLE_KEYWORDS: &[&str] = &[
    "会议", "开会", "会面", "约", "提醒", "截止", "任务", "项目", "待办", "计划", "安排",
    "报销", "工资", "收入", "支出", "花了", "付款", "转账", "预算", "账单", "发票",
    "明天", "后天", "下周", "周一", "周二", "周三", "周四", "周五", "周六", "周日",
    "meeting", "deadline", "todo", "task", "budget", "invoice", "tomorrow",
];

const NUMBER_UNITS: &[char] = &['点', '时', '号', '日', '月', '元', '块', '%', ':', '：'];

/// Keyword / pattern heuristic; never calls the model and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSavableInfoDetector;

impl KeywordSavableInfoDetector {
    fn looks_savable(text: &str) -> bool {
        let lower = text.to_lowercase();
        if SAVABLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return true;
        }
        // 数字后紧跟时间/金额单位，如 "3点"、"120元"、"15:30"
        let chars: Vec<char> = lower.chars().collect();
        chars
            .windows(2)
            .any(|w| w[0].is_ascii_digit() && NUMBER_UNITS.contains(&w[1]))
    }
}

#[async_trait]
impl SavableInfoDetector for KeywordSavableInfoDetector {
    async fn check(&self, user_message: &str, _reply: &str) -> Result<bool, SavableCheckError> {
        // 只看用户说的内容，回复里常常复述时间
        Ok(Self::looks_savable(user_message))
    }
}
