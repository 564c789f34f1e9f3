//! # Prompt
//!
//! Chat message types and every fixed text the assistant sends to, or receives from, the model.
//!
//! ## Contents
//!
//! - **Messages**: [`ChatMessage`] / [`MessageRole`], one-to-one with the OpenAI `messages` array.
//! - **Conversation**: system persona, apology fallback, save confirmation, save-prompt suffix.
//! - **Extraction**: system message plus text and image prompts demanding a JSON array of
//!   `{title, description, category}` objects.
//! - **Savable check**: prompt asking for a bare `YES` / `NO`.
//!
//! ## External interactions
//!
//! - **AI models**: Output is sent to OpenAI-compatible chat completion APIs.

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Default persona for conversational replies.
pub const DEFAULT_SYSTEM_PERSONA: &str = "你是一个贴心的个人信息助理，帮助用户记录和整理日常信息，\
包括临时杂项、会议安排、工作安排和收入支出。回答要简洁、友好、准确。";

/// Reply used when the model could not produce one.
pub const APOLOGY_REPLY: &str = "抱歉，我暂时无法回答这个问题，请稍后再试。";

/// Reply to a save directive once the items are stored.
pub const SAVE_CONFIRMATION: &str = "好的，已为您保存相关信息。";

/// Appended to a reply when the exchange looks worth saving.
pub const SAVE_PROMPT_SUFFIX: &str = "\n\n如需保存以上信息，请回复“保存”。";

/// System message for extraction calls.
pub const EXTRACTION_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant that extracts and categorizes information from text.";

const CATEGORY_GUIDE_TEXT: &str = "分类选项：
1. temporary (临时杂项) - 日常琐事、临时想法等
2. meeting (会议安排) - 会议时间、地点、议题等
3. work (工作安排) - 任务、项目、工作计划等
4. finance (收入支出) - 费用、收入、预算等";

const JSON_FORMAT_INSTRUCTION: &str = r#"请按照以下JSON格式返回结果：
[
  {
    "title": "信息项标题",
    "description": "信息项详细描述",
    "category": "temporary|meeting|work|finance"
  },
  ...
]

只返回JSON数组，不要包含其他内容。"#;

/// Builds the extraction prompt for inline text.
pub fn text_extraction_prompt(text: &str) -> String {
    format!(
        "请分析以下文本内容，从中提取出多个独立的信息项，并为每个信息项分配适当的分类。\n\n\
         {CATEGORY_GUIDE_TEXT}\n\n\
         文本内容：\n\"{text}\"\n\n\
         {JSON_FORMAT_INSTRUCTION}"
    )
}

/// Extraction prompt sent alongside an image.
pub const IMAGE_EXTRACTION_PROMPT: &str = r#"请分析这张图片中的内容，从中提取出多个独立的信息项，并为每个信息项分配适当的分类。

分类选项：
1. temporary (临时杂项) - 日常琐事、临时想法、便签、随手记录等
2. meeting (会议安排) - 会议时间、地点、议题、参会人员、会议记录等
3. work (工作安排) - 任务清单、项目计划、工作进度、待办事项、工作笔记等
4. finance (收入支出) - 发票、收据、账单、预算表、费用明细、工资条等

要求：
1. 仔细识别图片中的文字内容和语义信息
2. 每个信息项应该是一个完整的、有意义的信息单元
3. 标题应该简洁明了，描述应该详细准确
4. 严格按照上述4个分类进行归类，不要创造新的分类
5. 如果无法识别有效信息，请返回空数组[]

请按照以下JSON格式返回结果：
[
  {
    "title": "信息项标题",
    "description": "信息项详细描述",
    "category": "temporary|meeting|work|finance"
  },
  ...
]

只返回JSON数组，不要包含其他内容。"#;

/// System message for the savable-information check.
pub const SAVABLE_CHECK_SYSTEM_MESSAGE: &str =
    "You decide whether a conversation contains information worth saving. Answer with YES or NO only.";

/// Builds the savable check prompt for one user message and its reply.
pub fn savable_check_prompt(user_message: &str, reply: &str) -> String {
    format!(
        "判断下面这段对话是否包含值得用户保存的具体信息，例如会议时间地点、工作任务、待办事项、收入支出金额等。\n\
         只回答 YES 或 NO。\n\n\
         用户：{user_message}\n\
         助手：{reply}"
    )
}

/// Formats one turn as a transcript line: `{role}: {content}`.
pub fn transcript_line(role: &str, content: &str) -> String {
    format!("{}: {}", role, content)
}

/// Builds the message list for a conversational reply.
///
/// # Order
///
/// System persona → history (already in chronological order) → current user message.
pub fn build_reply_messages<I>(system_persona: &str, history: I, current: &str) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = ChatMessage>,
{
    let mut messages = vec![ChatMessage::system(system_persona)];
    messages.extend(history);
    messages.push(ChatMessage::user(current));
    messages
}
