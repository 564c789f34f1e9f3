//! Integration tests for ConversationOrchestrator over the in-memory store and scripted LLMs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conversation::{
    ConversationOrchestrator, CycleError, CycleKind, OrchestratorSettings,
    DEFAULT_TRUNCATION_MARKER,
};
use extraction::{SavableCheckError, SavableInfoDetector};
use infobot_core::{
    Category, Conversation, InformationItem, Role, StoredInformationItem, Turn,
    DEFAULT_CONVERSATION_TITLE,
};
use llm_client::{LlmClient, LlmError};
use memory::ContextBuilder;
use prompt::{
    ChatMessage, MessageRole, APOLOGY_REPLY, EXTRACTION_SYSTEM_MESSAGE, SAVE_CONFIRMATION,
    SAVE_PROMPT_SUFFIX,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage::{ConversationStore, InMemoryConversationStore, StorageError};
use tokio_util::sync::CancellationToken;

const USER: i64 = 1;

/// Answers reply calls and extraction calls separately and records both.
struct ScriptedLlm {
    reply: Result<String, String>,
    extraction: Result<String, String>,
    delay: Duration,
    reply_calls: Mutex<Vec<Vec<ChatMessage>>>,
    extraction_calls: Mutex<Vec<Vec<ChatMessage>>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedLlm {
    fn new(reply: Result<&str, &str>, extraction: Result<&str, &str>) -> Self {
        Self {
            reply: reply.map(str::to_string).map_err(str::to_string),
            extraction: extraction.map(str::to_string).map_err(str::to_string),
            delay: Duration::ZERO,
            reply_calls: Mutex::new(Vec::new()),
            extraction_calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    fn replying(reply: &str) -> Self {
        Self::new(Ok(reply), Err("no extraction scripted"))
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn reply_calls(&self) -> Vec<Vec<ChatMessage>> {
        self.reply_calls.lock().unwrap().clone()
    }

    fn extraction_calls(&self) -> Vec<Vec<ChatMessage>> {
        self.extraction_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let is_extraction = messages
            .first()
            .is_some_and(|m| m.content == EXTRACTION_SYSTEM_MESSAGE);
        if is_extraction {
            self.extraction_calls.lock().unwrap().push(messages);
        } else {
            self.reply_calls.lock().unwrap().push(messages);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let scripted = if is_extraction {
            &self.extraction
        } else {
            &self.reply
        };
        scripted.clone().map_err(LlmError::Request)
    }

    async fn complete_with_image(&self, _prompt: &str, _image_ref: &str) -> Result<String, LlmError> {
        Err(LlmError::Request("vision not scripted".to_string()))
    }
}

/// `None` makes `check` fail.
struct FixedSavable {
    verdict: Option<bool>,
    calls: AtomicUsize,
}

impl FixedSavable {
    fn new(verdict: Option<bool>) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SavableInfoDetector for FixedSavable {
    async fn check(&self, _user_message: &str, _reply: &str) -> Result<bool, SavableCheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
            .ok_or_else(|| SavableCheckError::ExternalCall(LlmError::Timeout(Duration::from_secs(30))))
    }
}

/// Delegates to the in-memory store; can refuse assistant turns or fire a token while the
/// item batch is being written.
struct HookedStore {
    inner: InMemoryConversationStore,
    fail_assistant_writes: bool,
    cancel_on_item_write: Option<CancellationToken>,
}

impl HookedStore {
    fn new() -> Self {
        Self {
            inner: InMemoryConversationStore::new(),
            fail_assistant_writes: false,
            cancel_on_item_write: None,
        }
    }
}

#[async_trait]
impl ConversationStore for HookedStore {
    async fn create_conversation(&self, user_id: i64, title: &str) -> Result<Conversation, StorageError> {
        self.inner.create_conversation(user_id, title).await
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>, StorageError> {
        self.inner.get_conversation(conversation_id).await
    }

    async fn list_conversations(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Conversation>, StorageError> {
        self.inner.list_conversations(user_id, since).await
    }

    async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<(), StorageError> {
        self.inner.rename_conversation(conversation_id, title).await
    }

    async fn get_recent_turns(&self, conversation_id: &str, limit: usize) -> Result<Vec<Turn>, StorageError> {
        self.inner.get_recent_turns(conversation_id, limit).await
    }

    async fn append_turn(&self, conversation_id: &str, role: Role, content: &str) -> Result<Turn, StorageError> {
        if self.fail_assistant_writes && role == Role::Assistant {
            return Err(StorageError::Database("disk I/O error".to_string()));
        }
        self.inner.append_turn(conversation_id, role, content).await
    }

    async fn append_information_items(
        &self,
        user_id: i64,
        conversation_id: Option<&str>,
        items: &[InformationItem],
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        if let Some(cancel) = &self.cancel_on_item_write {
            cancel.cancel();
        }
        self.inner
            .append_information_items(user_id, conversation_id, items)
            .await
    }

    async fn get_information_item(
        &self,
        user_id: i64,
        item_id: &str,
    ) -> Result<Option<StoredInformationItem>, StorageError> {
        self.inner.get_information_item(user_id, item_id).await
    }

    async fn list_information_items(
        &self,
        user_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        self.inner.list_information_items(user_id, category).await
    }

    async fn list_conversation_items(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<StoredInformationItem>, StorageError> {
        self.inner.list_conversation_items(conversation_id).await
    }

    async fn touch_conversation(&self, conversation_id: &str) -> Result<(), StorageError> {
        self.inner.touch_conversation(conversation_id).await
    }
}

struct Harness {
    store: Arc<InMemoryConversationStore>,
    llm: Arc<ScriptedLlm>,
    savable: Arc<FixedSavable>,
    orchestrator: ConversationOrchestrator,
    conversation_id: String,
}

async fn harness_with(
    llm: ScriptedLlm,
    savable: Arc<FixedSavable>,
    settings: OrchestratorSettings,
) -> Harness {
    let store = Arc::new(InMemoryConversationStore::new());
    let llm = Arc::new(llm);
    let conversation = store
        .create_conversation(USER, DEFAULT_CONVERSATION_TITLE)
        .await
        .unwrap();
    let orchestrator =
        ConversationOrchestrator::new(store.clone(), llm.clone(), savable.clone(), settings);
    Harness {
        store,
        llm,
        savable,
        orchestrator,
        conversation_id: conversation.id,
    }
}

async fn harness(llm: ScriptedLlm, savable: Arc<FixedSavable>) -> Harness {
    harness_with(llm, savable, OrchestratorSettings::default()).await
}

impl Harness {
    async fn send(&self, content: &str) -> Result<conversation::CycleOutcome, CycleError> {
        self.orchestrator
            .handle_message(USER, &self.conversation_id, content, &CancellationToken::new())
            .await
    }

    async fn turns(&self) -> Vec<Turn> {
        self.store
            .get_recent_turns(&self.conversation_id, 100)
            .await
            .unwrap()
    }
}

/// **Test: plain reply cycle**
///
/// **Setup:** Fresh conversation, model replies "你好！", savable check says no.
///
/// **Action:** Send "你好".
///
/// **Expected:** Both turns persisted in order; prompt is persona + message; title renamed.
#[tokio::test]
async fn test_reply_cycle_persists_both_turns() {
    let h = harness(ScriptedLlm::replying("你好！"), FixedSavable::new(Some(false))).await;

    let outcome = h.send("你好").await.unwrap();

    assert_eq!(outcome.user_turn.content, "你好");
    assert_eq!(outcome.user_turn.role, Role::User);
    assert_eq!(outcome.assistant_turn.content, "你好！");
    assert_eq!(outcome.assistant_turn.role, Role::Assistant);
    assert_eq!(
        outcome.kind,
        CycleKind::Replied {
            fell_back: false,
            save_prompt_appended: false
        }
    );

    let turns = h.turns().await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].id, outcome.user_turn.id);
    assert_eq!(turns[1].id, outcome.assistant_turn.id);

    let calls = h.llm.reply_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][0].role, MessageRole::System);
    assert_eq!(calls[0][1], ChatMessage::user("你好"));

    let conversation = h
        .store
        .get_conversation(&h.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.title, "你好");
    assert!(conversation.updated_at >= conversation.created_at);
}

/// **Test: context carries prior turns but not the current one twice**
#[tokio::test]
async fn test_second_cycle_sends_history() {
    let h = harness(ScriptedLlm::replying("收到"), FixedSavable::new(Some(false))).await;

    h.send("第一条").await.unwrap();
    h.send("第二条").await.unwrap();

    let calls = h.llm.reply_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1][1..].to_vec(),
        vec![
            ChatMessage::user("第一条"),
            ChatMessage::assistant("收到"),
            ChatMessage::user("第二条"),
        ]
    );

    // 只有首条消息改标题
    let conversation = h.store.get_conversation(&h.conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.title, "第一条");
}

/// **Test: save directive extracts, stores and confirms without a reply call**
///
/// **Setup:** One prior exchange about a meeting; extraction returns one meeting item.
///
/// **Action:** Send "保存".
///
/// **Expected:** Item stored for user and conversation, fixed confirmation, no extra reply
/// call, no savable check.
#[tokio::test]
async fn test_save_directive_extracts_without_reply_call() {
    let llm = ScriptedLlm::new(
        Ok("好的，我记住了"),
        Ok(r#"[{"title": "项目会议", "description": "明天下午三点开会", "category": "meeting"}]"#),
    );
    let h = harness(llm, FixedSavable::new(Some(false))).await;

    h.send("明天下午三点开会").await.unwrap();
    let savable_calls_before = h.savable.calls();

    let outcome = h.send("保存").await.unwrap();

    assert_eq!(outcome.assistant_turn.content, SAVE_CONFIRMATION);
    let CycleKind::Saved { items } = &outcome.kind else {
        panic!("expected save cycle, got {:?}", outcome.kind);
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item.category, Category::Meeting);
    assert_eq!(items[0].conversation_id.as_deref(), Some(h.conversation_id.as_str()));

    assert_eq!(h.llm.reply_calls().len(), 1);
    assert_eq!(h.savable.calls(), savable_calls_before);

    let extraction_calls = h.llm.extraction_calls();
    assert_eq!(extraction_calls.len(), 1);
    let prompt_text = &extraction_calls[0][1].content;
    assert!(prompt_text.contains("user: 明天下午三点开会"));
    assert!(prompt_text.contains("assistant: 好的，我记住了"));
    assert!(!prompt_text.contains("user: 保存"));

    let stored = h.store.list_information_items(USER, None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(h.turns().await.len(), 4);
}

/// **Test: save directive still confirms when extraction fails**
#[tokio::test]
async fn test_save_directive_with_failed_extraction_stores_fallback() {
    let llm = ScriptedLlm::new(Ok("好的"), Ok("not json"));
    let h = harness(llm, FixedSavable::new(Some(false))).await;

    h.send("周五交报告").await.unwrap();
    let outcome = h.send("  SAVE ").await.unwrap();

    assert_eq!(outcome.assistant_turn.content, SAVE_CONFIRMATION);
    let stored = h.store.list_information_items(USER, None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].item.category, Category::Temporary);
    assert!(stored[0].item.description.contains("user: 周五交报告"));
}

/// **Test: save directive on an empty conversation stores the single fallback item**
#[tokio::test]
async fn test_save_directive_without_history() {
    let llm = ScriptedLlm::new(Ok("unused"), Ok("[]"));
    let h = harness(llm, FixedSavable::new(Some(true))).await;

    let outcome = h.send("保存").await.unwrap();

    assert_eq!(outcome.assistant_turn.content, SAVE_CONFIRMATION);
    assert_eq!(h.llm.extraction_calls().len(), 0);
    let stored = h.store.list_information_items(USER, None).await.unwrap();
    assert_eq!(stored.len(), 1);
}

/// **Test: savable exchange gets the save prompt appended**
#[tokio::test]
async fn test_savable_reply_gets_suffix() {
    let h = harness(ScriptedLlm::replying("好的，已记下明天的会议。"), FixedSavable::new(Some(true))).await;

    let outcome = h.send("明天上午十点开会").await.unwrap();

    assert_eq!(
        outcome.assistant_turn.content,
        format!("好的，已记下明天的会议。{}", SAVE_PROMPT_SUFFIX)
    );
    assert!(outcome.assistant_turn.content.starts_with("好的，已记下明天的会议。"));
    assert_eq!(
        outcome.kind,
        CycleKind::Replied {
            fell_back: false,
            save_prompt_appended: true
        }
    );
}

/// **Test: savable check failure leaves the reply untouched**
///
/// **Setup:** Savable detector errors.
///
/// **Expected:** Reply returned and persisted unmodified; cycle completes.
#[tokio::test]
async fn test_savable_failure_leaves_reply_unmodified() {
    let h = harness(ScriptedLlm::replying("明白了"), FixedSavable::new(None)).await;

    let outcome = h.send("明天开会").await.unwrap();

    assert_eq!(outcome.assistant_turn.content, "明白了");
    assert_eq!(h.savable.calls(), 1);
    let turns = h.turns().await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].content, "明白了");
}

/// **Test: reply failure degrades to the apology**
#[tokio::test]
async fn test_reply_failure_uses_apology() {
    let llm = ScriptedLlm::new(Err("429 quota exceeded"), Err("unused"));
    let h = harness(llm, FixedSavable::new(Some(true))).await;

    let outcome = h.send("你好").await.unwrap();

    assert_eq!(outcome.assistant_turn.content, APOLOGY_REPLY);
    assert_eq!(
        outcome.kind,
        CycleKind::Replied {
            fell_back: true,
            save_prompt_appended: false
        }
    );
    assert_eq!(h.savable.calls(), 0);
    assert_eq!(h.turns().await.len(), 2);
}

#[tokio::test]
async fn test_blank_reply_uses_apology() {
    let h = harness(ScriptedLlm::replying("  \n"), FixedSavable::new(Some(false))).await;
    let outcome = h.send("你好").await.unwrap();
    assert_eq!(outcome.assistant_turn.content, APOLOGY_REPLY);
}

/// **Test: cancellation during reply generation writes no assistant turn**
///
/// **Setup:** Model takes an hour; token cancelled after 10ms (paused clock).
///
/// **Expected:** `CycleError::Cancelled`; only the user turn exists.
#[tokio::test(start_paused = true)]
async fn test_cancel_during_reply_writes_no_assistant_turn() {
    let llm = ScriptedLlm::replying("太晚了").with_delay(Duration::from_secs(3600));
    let h = harness(llm, FixedSavable::new(Some(false))).await;

    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        })
    };

    let result = h
        .orchestrator
        .handle_message(USER, &h.conversation_id, "你好", &cancel)
        .await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(CycleError::Cancelled)));
    let turns = h.turns().await;
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
}

#[tokio::test]
async fn test_already_cancelled_writes_nothing() {
    let h = harness(ScriptedLlm::replying("hi"), FixedSavable::new(Some(false))).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = h
        .orchestrator
        .handle_message(USER, &h.conversation_id, "你好", &cancel)
        .await;

    assert!(matches!(result, Err(CycleError::Cancelled)));
    assert!(h.turns().await.is_empty());
    assert!(h.llm.reply_calls().is_empty());
}

/// **Test: persistence failure aborts the cycle**
#[tokio::test]
async fn test_persistence_error_aborts_cycle() {
    let store = Arc::new(HookedStore {
        fail_assistant_writes: true,
        ..HookedStore::new()
    });
    let conversation = store.create_conversation(USER, "会议").await.unwrap();
    let orchestrator = ConversationOrchestrator::new(
        store.clone(),
        Arc::new(ScriptedLlm::replying("好的")),
        FixedSavable::new(Some(false)),
        OrchestratorSettings::default(),
    );

    let result = orchestrator
        .handle_message(USER, &conversation.id, "你好", &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(CycleError::Persistence(StorageError::Database(_)))
    ));
    let turns = store.get_recent_turns(&conversation.id, 10).await.unwrap();
    assert_eq!(turns.len(), 1);
}

#[tokio::test]
async fn test_empty_content_rejected() {
    let h = harness(ScriptedLlm::replying("hi"), FixedSavable::new(Some(false))).await;

    assert!(matches!(h.send("").await, Err(CycleError::EmptyContent)));
    assert!(matches!(h.send(" \n\t").await, Err(CycleError::EmptyContent)));
    assert!(h.turns().await.is_empty());
}

#[tokio::test]
async fn test_unknown_or_foreign_conversation_rejected() {
    let h = harness(ScriptedLlm::replying("hi"), FixedSavable::new(Some(false))).await;

    let result = h
        .orchestrator
        .handle_message(USER, "missing", "你好", &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(CycleError::ConversationNotFound(id)) if id == "missing"));

    let result = h
        .orchestrator
        .handle_message(2, &h.conversation_id, "你好", &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(CycleError::NotOwner(_))));
    assert!(h.turns().await.is_empty());
}

/// **Test: long message is bounded in the prompt but stored whole**
#[tokio::test]
async fn test_long_message_truncated_only_in_prompt() {
    let settings = OrchestratorSettings {
        max_prompt_chars: 10,
        ..OrchestratorSettings::default()
    };
    let h = harness_with(ScriptedLlm::replying("好"), FixedSavable::new(Some(false)), settings).await;
    let long = "很".repeat(50);

    let outcome = h.send(&long).await.unwrap();

    assert_eq!(outcome.user_turn.content, long);
    let calls = h.llm.reply_calls();
    let sent = &calls[0].last().unwrap().content;
    assert_eq!(sent, &format!("{}{}", "很".repeat(10), DEFAULT_TRUNCATION_MARKER));

    let conversation = h.store.get_conversation(&h.conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.title, format!("{}...", "很".repeat(30)));
}

/// **Test: history window respects the turn limit**
#[tokio::test]
async fn test_history_limit_applied() {
    let settings = OrchestratorSettings {
        history_limit: 2,
        ..OrchestratorSettings::default()
    };
    let h = harness_with(ScriptedLlm::replying("ok"), FixedSavable::new(Some(false)), settings).await;

    for i in 0..3 {
        h.send(&format!("消息{}", i)).await.unwrap();
    }

    let calls = h.llm.reply_calls();
    let last = calls.last().unwrap();
    // persona + 2 history turns + current
    assert_eq!(last.len(), 4);
    assert_eq!(last[1], ChatMessage::user("消息1"));
    assert_eq!(last[3], ChatMessage::user("消息2"));
}

/// **Test: cycles on one conversation are serialized**
///
/// **Setup:** Model takes 50ms per reply; two cycles started concurrently.
///
/// **Expected:** Never more than one model call in flight; turns alternate user/assistant.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_same_conversation_cycles_are_serialized() {
    let llm = ScriptedLlm::replying("ok").with_delay(Duration::from_millis(50));
    let h = Arc::new(harness(llm, FixedSavable::new(Some(false))).await);

    let a = {
        let h = h.clone();
        tokio::spawn(async move { h.send("第一").await })
    };
    let b = {
        let h = h.clone();
        tokio::spawn(async move { h.send("第二").await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(h.llm.max_active.load(Ordering::SeqCst), 1);
    let roles: Vec<Role> = h.turns().await.iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

/// **Test: cancel landing while the item batch is written still ends with a confirmation**
///
/// **Setup:** One prior exchange; extraction returns two items; the store fires the token
/// inside the item write.
///
/// **Expected:** Both items stored exactly once, the confirmation turn follows the "保存" turn,
/// and the cycle reports `Saved`, so the user never sees "cancelled" for stored items.
#[tokio::test]
async fn test_cancel_during_item_write_still_confirms() {
    let cancel = CancellationToken::new();
    let store = Arc::new(HookedStore {
        cancel_on_item_write: Some(cancel.clone()),
        ..HookedStore::new()
    });
    let conversation = store.create_conversation(USER, DEFAULT_CONVERSATION_TITLE).await.unwrap();
    let llm = ScriptedLlm::new(
        Ok("好的"),
        Ok(r#"[{"title": "评审会", "description": "周五三点", "category": "meeting"},
              {"title": "报销", "description": "周一前提交", "category": "finance"}]"#),
    );
    let orchestrator = ConversationOrchestrator::new(
        store.clone(),
        Arc::new(llm),
        FixedSavable::new(Some(false)),
        OrchestratorSettings::default(),
    );
    orchestrator
        .handle_message(USER, &conversation.id, "周五三点评审会，周一前交报销", &CancellationToken::new())
        .await
        .unwrap();

    let outcome = orchestrator
        .handle_message(USER, &conversation.id, "保存", &cancel)
        .await
        .unwrap();

    assert!(cancel.is_cancelled());
    assert!(matches!(&outcome.kind, CycleKind::Saved { items } if items.len() == 2));
    assert_eq!(outcome.assistant_turn.content, SAVE_CONFIRMATION);
    assert_eq!(store.list_information_items(USER, None).await.unwrap().len(), 2);
    let roles: Vec<Role> = store
        .get_recent_turns(&conversation.id, 10)
        .await
        .unwrap()
        .iter()
        .map(|t| t.role)
        .collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

/// **Test: cancel during extraction stores no items and no confirmation**
///
/// **Setup:** Extraction takes an hour; token cancelled after 10ms (paused clock).
///
/// **Expected:** `CycleError::Cancelled`; no items; the "保存" turn is the last turn.
#[tokio::test(start_paused = true)]
async fn test_cancel_during_extraction_stores_nothing() {
    let llm = ScriptedLlm::new(
        Ok("好的"),
        Ok(r#"[{"title": "评审会", "description": "周五三点", "category": "meeting"}]"#),
    )
    .with_delay(Duration::from_secs(3600));
    let h = harness(llm, FixedSavable::new(Some(false))).await;
    h.send("周五三点评审会").await.unwrap();

    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        })
    };
    let result = h
        .orchestrator
        .handle_message(USER, &h.conversation_id, "保存", &cancel)
        .await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(CycleError::Cancelled)));
    assert!(h.store.list_information_items(USER, None).await.unwrap().is_empty());
    let turns = h.turns().await;
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[2].content, "保存");
}

/// **Test: a replacement context builder with a larger cap sees more history**
///
/// **Setup:** `history_limit` 2, builder capped at 4 turns.
///
/// **Expected:** The third reply call carries four history turns.
#[tokio::test]
async fn test_context_builder_cap_above_history_limit() {
    let settings = OrchestratorSettings {
        history_limit: 2,
        ..OrchestratorSettings::default()
    };
    let store = Arc::new(InMemoryConversationStore::new());
    let conversation = store.create_conversation(USER, "t").await.unwrap();
    let llm = Arc::new(ScriptedLlm::replying("ok"));
    let orchestrator =
        ConversationOrchestrator::new(store.clone(), llm.clone(), FixedSavable::new(Some(false)), settings)
            .with_context_builder(ContextBuilder::new().with_max_turns(4).with_budget(10_000));

    for i in 0..3 {
        orchestrator
            .handle_message(USER, &conversation.id, &format!("消息{}", i), &CancellationToken::new())
            .await
            .unwrap();
    }

    let calls = llm.reply_calls();
    let last = calls.last().unwrap();
    // persona + 4 history turns + current
    assert_eq!(last.len(), 6);
    assert_eq!(last[1], ChatMessage::user("消息0"));
    assert_eq!(last[5], ChatMessage::user("消息2"));
}
