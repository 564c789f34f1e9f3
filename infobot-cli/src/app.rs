//! Component wiring: store → LLM (with timeout) → extraction / savable detection → orchestrator.

use anyhow::{Context, Result};
use conversation::{ConversationOrchestrator, UploadProcessor};
use extraction::{
    ExtractionEngine, KeywordSavableInfoDetector, LlmSavableInfoDetector, SavableInfoDetector,
};
use llm_client::{LlmClient, LlmConfig, OpenAILlmClient, WithTimeout};
use std::path::Path;
use std::sync::Arc;
use storage::{ConversationStore, InMemoryConversationStore, SqliteConversationStore};
use tracing::info;

use crate::config::{AppConfig, SavableDetectorKind, StoreType};

pub struct App {
    pub store: Arc<dyn ConversationStore>,
    pub orchestrator: ConversationOrchestrator,
    pub uploads: UploadProcessor,
}

impl App {
    pub async fn build(config: &AppConfig, llm_config: &LlmConfig) -> Result<Self> {
        let store = open_store(config).await?;

        info!(
            model = %llm_config.model,
            vision_model = %llm_config.vision_model,
            base_url = %llm_config.base_url,
            timeout_secs = llm_config.timeout.as_secs(),
            "LLM client configured"
        );
        let llm: Arc<dyn LlmClient> = Arc::new(WithTimeout::new(
            OpenAILlmClient::from_config(llm_config),
            llm_config.timeout,
        ));

        let savable: Arc<dyn SavableInfoDetector> = match config.savable_detector {
            SavableDetectorKind::Llm => Arc::new(LlmSavableInfoDetector::new(llm.clone())),
            SavableDetectorKind::Keyword => Arc::new(KeywordSavableInfoDetector),
        };

        let orchestrator = ConversationOrchestrator::new(
            store.clone(),
            llm.clone(),
            savable,
            config.orchestrator_settings(),
        );
        let uploads = UploadProcessor::new(store.clone(), ExtractionEngine::new(llm));

        Ok(Self {
            store,
            orchestrator,
            uploads,
        })
    }
}

/// Opens the configured store. Needs no LLM configuration.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ConversationStore>> {
    match config.store_type {
        StoreType::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(InMemoryConversationStore::new()))
        }
        StoreType::Sqlite => {
            if let Some(parent) = config.sqlite_file_path().and_then(|p| Path::new(p).parent()) {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Create data directory {}", parent.display()))?;
                }
            }
            let store = SqliteConversationStore::new(&config.database_url)
                .await
                .with_context(|| format!("Open database {}", config.database_url))?;
            Ok(Arc::new(store))
        }
    }
}
