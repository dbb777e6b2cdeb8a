//! Draftsmith core
//!
//! The knowledge-retrieval and content-versioning engine behind an AI
//! content assistant:
//! - chunking and embedding-backed retrieval with layered fallbacks
//! - the draft/publish/unpublish lifecycle for generated content, kept
//!   consistent with the knowledge base it feeds
//! - bounded RAG context assembly for the prompt layer
//!
//! HTTP transport, prompt assembly and schema CRUD are the embedding
//! application's concern; this crate exposes services wired through
//! [`create_core_context`].

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use config::StorageBackend;
use domain::{
    ChatHistoryRepository, ChatSessionRepository, CompletionProvider, ContentVersionRepository,
    EmbeddingProvider, KnowledgeStore,
};
use infrastructure::chat::{
    InMemoryChatHistoryRepository, InMemoryChatSessionRepository, PostgresChatHistoryRepository,
    PostgresChatSessionRepository,
};
use infrastructure::completion::OpenAiCompletionProvider;
use infrastructure::content::{InMemoryContentVersionRepository, PostgresContentVersionRepository};
use infrastructure::embedding::OpenAiEmbeddingProvider;
use infrastructure::http_client::HttpClient;
use infrastructure::ingestion::chunkers::ChunkerFactory;
use infrastructure::knowledge::{InMemoryKnowledgeStore, PgvectorConfig, PgvectorKnowledgeStore};
use infrastructure::services::{
    ContentVersionManager, ContextAssembler, IngestionService, RetrievalPipeline,
    SessionTitleService,
};
use tracing::info;

/// Timeout applied to every embedding/completion request
const EXTERNAL_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// The wired-up core: collaborator handles plus the services built on them.
///
/// Collaborators are constructed once here and injected into each service,
/// so hosts and tests can substitute their own implementations by wiring the
/// services directly instead.
#[derive(Clone)]
pub struct CoreContext {
    pub knowledge_store: Arc<dyn KnowledgeStore>,
    pub content_versions: Arc<dyn ContentVersionRepository>,
    pub chat_history: Arc<dyn ChatHistoryRepository>,
    pub chat_sessions: Arc<dyn ChatSessionRepository>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub completion: Arc<dyn CompletionProvider>,
    pub retrieval: Arc<RetrievalPipeline>,
    pub ingestion: Arc<IngestionService>,
    pub versioning: Arc<ContentVersionManager>,
    pub assembler: Arc<ContextAssembler>,
    pub session_titles: Arc<SessionTitleService>,
}

/// Create the core context with the default configuration
pub async fn create_core_context() -> anyhow::Result<CoreContext> {
    create_core_context_with_config(&AppConfig::default()).await
}

/// Create the core context with custom configuration
pub async fn create_core_context_with_config(config: &AppConfig) -> anyhow::Result<CoreContext> {
    let api_key =
        std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "sk-placeholder".to_string());

    let http = HttpClient::with_timeout(EXTERNAL_CALL_TIMEOUT)?;

    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.base_url.as_deref() {
        Some(base_url) => Arc::new(
            OpenAiEmbeddingProvider::with_base_url(http.clone(), &api_key, base_url)
                .with_model(&config.embedding.model, config.embedding.dimensions),
        ),
        None => Arc::new(
            OpenAiEmbeddingProvider::new(http.clone(), &api_key)
                .with_model(&config.embedding.model, config.embedding.dimensions),
        ),
    };

    let completion: Arc<dyn CompletionProvider> = match config.completion.base_url.as_deref() {
        Some(base_url) => Arc::new(
            OpenAiCompletionProvider::with_base_url(http.clone(), &api_key, base_url)
                .with_model(&config.completion.model)
                .with_temperature(config.completion.temperature)
                .with_max_tokens(config.completion.max_tokens),
        ),
        None => Arc::new(
            OpenAiCompletionProvider::new(http, &api_key)
                .with_model(&config.completion.model)
                .with_temperature(config.completion.temperature)
                .with_max_tokens(config.completion.max_tokens),
        ),
    };

    let (knowledge_store, content_versions, chat_history, chat_sessions): (
        Arc<dyn KnowledgeStore>,
        Arc<dyn ContentVersionRepository>,
        Arc<dyn ChatHistoryRepository>,
        Arc<dyn ChatSessionRepository>,
    ) = match config.storage.backend {
        StorageBackend::Postgres => {
            let database_url = std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

            info!("Connecting to PostgreSQL...");
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
            info!("PostgreSQL connection established");

            let knowledge = PgvectorKnowledgeStore::new(
                pool.clone(),
                PgvectorConfig::new(config.embedding.dimensions as u32),
            );
            knowledge.ensure_schema().await?;

            let versions = PostgresContentVersionRepository::new(pool.clone());
            versions.ensure_schema().await?;

            let history = PostgresChatHistoryRepository::new(pool.clone());
            history.ensure_schema().await?;

            let sessions = PostgresChatSessionRepository::new(pool);
            sessions.ensure_schema().await?;

            (
                Arc::new(knowledge),
                Arc::new(versions),
                Arc::new(history),
                Arc::new(sessions),
            )
        }
        StorageBackend::InMemory => {
            info!("Using in-memory storage");
            (
                Arc::new(InMemoryKnowledgeStore::new()),
                Arc::new(InMemoryContentVersionRepository::new()),
                Arc::new(InMemoryChatHistoryRepository::new()),
                Arc::new(InMemoryChatSessionRepository::new()),
            )
        }
    };

    let retrieval = Arc::new(RetrievalPipeline::new(
        knowledge_store.clone(),
        embedder.clone(),
        config.retrieval.clone(),
    ));

    let ingestion = Arc::new(IngestionService::new(
        knowledge_store.clone(),
        embedder.clone(),
        ChunkerFactory::create(config.chunking_strategy),
        config.chunking.clone(),
    ));

    let versioning = Arc::new(ContentVersionManager::new(
        content_versions.clone(),
        knowledge_store.clone(),
        embedder.clone(),
    ));

    let assembler = Arc::new(ContextAssembler::new(
        chat_history.clone(),
        retrieval.clone(),
        config.context.clone(),
    ));

    let session_titles = Arc::new(SessionTitleService::new(
        completion.clone(),
        chat_sessions.clone(),
        chat_history.clone(),
    ));

    Ok(CoreContext {
        knowledge_store,
        content_versions,
        chat_history,
        chat_sessions,
        embedder,
        completion,
        retrieval,
        ingestion,
        versioning,
        assembler,
        session_titles,
    })
}
