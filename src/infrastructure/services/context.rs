//! RAG context assembly

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::chat::{ChatHistoryRepository, ChatMessage};
use crate::domain::context::RagContext;
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::knowledge::{KnowledgeEntry, KnowledgeSource};
use crate::domain::schema::SchemaSearcher;
use crate::domain::DomainError;
use crate::infrastructure::services::retrieval::RetrievalPipeline;

/// Context assembly tuning knobs
#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    /// Number of trailing chat messages included
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Combined knowledge cap when merging session and project results
    #[serde(default = "default_merge_cap")]
    pub attachment_merge_cap: usize,
    /// Schema search result cap
    #[serde(default = "default_schema_limit")]
    pub schema_search_limit: usize,
}

fn default_history_window() -> usize {
    10
}

fn default_merge_cap() -> usize {
    8
}

fn default_schema_limit() -> usize {
    10
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            attachment_merge_cap: default_merge_cap(),
            schema_search_limit: default_schema_limit(),
        }
    }
}

/// Composes chat history and retrieved knowledge into the bounded context
/// object consumed by the prompt layer. History and knowledge are fetched
/// concurrently; an optional schema searcher contributes structured results.
#[derive(Debug)]
pub struct ContextAssembler {
    history: Arc<dyn ChatHistoryRepository>,
    retrieval: Arc<RetrievalPipeline>,
    schema: Option<Arc<dyn SchemaSearcher>>,
    config: ContextConfig,
}

impl ContextAssembler {
    /// Create a new context assembler
    pub fn new(
        history: Arc<dyn ChatHistoryRepository>,
        retrieval: Arc<RetrievalPipeline>,
        config: ContextConfig,
    ) -> Self {
        Self {
            history,
            retrieval,
            schema: None,
            config,
        }
    }

    /// Attach a schema searcher
    pub fn with_schema_searcher(mut self, schema: Arc<dyn SchemaSearcher>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Build context for a query using project-wide retrieval
    pub async fn build(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<RagContext, DomainError> {
        let (history, knowledge) = tokio::join!(
            self.history.list_for_session(session_id),
            self.retrieval.retrieve(project_id, query, None),
        );

        self.assemble(history?, knowledge, query).await
    }

    /// Build context when the user attached files: session-scoped results
    /// are merged ahead of project-wide ones up to the combined cap, so
    /// freshly uploaded material reaches the model even when a project-wide
    /// search ranks it poorly.
    pub async fn build_with_attachments(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<RagContext, DomainError> {
        let (history, session_knowledge, project_knowledge) = tokio::join!(
            self.history.list_for_session(session_id),
            self.retrieval
                .retrieve_session(project_id, session_id, query, None),
            self.retrieval.retrieve(project_id, query, None),
        );

        let merged = self.merge_knowledge(session_knowledge, project_knowledge);

        self.assemble(history?, merged, query).await
    }

    fn merge_knowledge(
        &self,
        session_results: Vec<KnowledgeEntry>,
        project_results: Vec<KnowledgeEntry>,
    ) -> Vec<KnowledgeEntry> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();

        for entry in session_results.into_iter().chain(project_results) {
            if merged.len() >= self.config.attachment_merge_cap {
                break;
            }
            if seen.insert(entry.id) {
                merged.push(entry);
            }
        }

        merged
    }

    async fn assemble(
        &self,
        history: Vec<ChatMessage>,
        knowledge: Vec<KnowledgeEntry>,
        query: &str,
    ) -> Result<RagContext, DomainError> {
        let window_start = history.len().saturating_sub(self.config.history_window);
        let chat_history = history[window_start..].to_vec();

        let mut context = RagContext::new(chat_history, knowledge);

        debug!(
            history = context.chat_history.len(),
            knowledge = context.relevant_knowledge.len(),
            published = context.knowledge_count_by_source(KnowledgeSource::PublishedContent),
            "assembled context"
        );

        if let Some(ref searcher) = self.schema {
            match searcher.search(query, self.config.schema_search_limit).await {
                Ok(hits) => context = context.with_schema_data(hits),
                Err(err) => {
                    warn!(%err, "schema search failed, continuing without schema data");
                }
            }
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::{ChatMessage, ChatRole};
    use crate::domain::embedding::mock::MockEmbeddingProvider;
    use crate::domain::knowledge::mock::MockKnowledgeStore;
    use crate::domain::knowledge::{KnowledgeSource, NewEntry};
    use crate::domain::schema::{SchemaHit, SchemaRecordType};
    use crate::infrastructure::chat::InMemoryChatHistoryRepository;
    use crate::infrastructure::schema::InMemorySchemaSearcher;
    use crate::infrastructure::services::retrieval::RetrievalConfig;

    fn project() -> ProjectId {
        ProjectId::new("p1").unwrap()
    }

    fn session() -> SessionId {
        SessionId::new("s1").unwrap()
    }

    fn retrieval(store: Arc<MockKnowledgeStore>) -> Arc<RetrievalPipeline> {
        Arc::new(RetrievalPipeline::new(
            store,
            Arc::new(MockEmbeddingProvider::new(8)),
            RetrievalConfig::default(),
        ))
    }

    async fn seed_history(history: &InMemoryChatHistoryRepository, count: usize) {
        for i in 0..count {
            history
                .append(ChatMessage::new(
                    session(),
                    if i % 2 == 0 {
                        ChatRole::User
                    } else {
                        ChatRole::Assistant
                    },
                    format!("message {}", i),
                ))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_history_trimmed_to_last_ten_ascending() {
        let store = Arc::new(MockKnowledgeStore::new());
        let history = Arc::new(InMemoryChatHistoryRepository::new());
        seed_history(&history, 15).await;

        let assembler =
            ContextAssembler::new(history, retrieval(store), ContextConfig::default());

        let context = assembler
            .build(&project(), &session(), "query")
            .await
            .unwrap();

        assert_eq!(context.chat_history.len(), 10);
        assert_eq!(context.chat_history[0].content, "message 5");
        assert_eq!(context.chat_history[9].content, "message 14");
        assert!(context
            .chat_history
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn test_attachment_merge_prioritizes_session_results() {
        let store = Arc::new(MockKnowledgeStore::new());

        for i in 0..6 {
            store
                .seed(NewEntry::new(
                    project(),
                    format!("project {}", i),
                    KnowledgeSource::WebScraping,
                    vec![0.0; 8],
                ))
                .await;
        }
        for i in 0..6 {
            store
                .seed(
                    NewEntry::new(
                        project(),
                        format!("session {}", i),
                        KnowledgeSource::UserUpload,
                        vec![0.0; 8],
                    )
                    .with_session(session()),
                )
                .await;
        }

        let history = Arc::new(InMemoryChatHistoryRepository::new());
        let assembler =
            ContextAssembler::new(history, retrieval(store), ContextConfig::default());

        let context = assembler
            .build_with_attachments(&project(), &session(), "query")
            .await
            .unwrap();

        // Capped at 8 combined, session-scoped entries first.
        assert_eq!(context.relevant_knowledge.len(), 8);
        for entry in &context.relevant_knowledge[..5] {
            assert!(entry.content.starts_with("session"));
        }
    }

    #[tokio::test]
    async fn test_attachment_merge_deduplicates() {
        let store = Arc::new(MockKnowledgeStore::new());

        // A session-scoped entry also shows up in the project-wide search.
        store
            .seed(
                NewEntry::new(
                    project(),
                    "shared entry",
                    KnowledgeSource::UserUpload,
                    vec![0.0; 8],
                )
                .with_session(session()),
            )
            .await;

        let history = Arc::new(InMemoryChatHistoryRepository::new());
        let assembler =
            ContextAssembler::new(history, retrieval(store), ContextConfig::default());

        let context = assembler
            .build_with_attachments(&project(), &session(), "query")
            .await
            .unwrap();

        assert_eq!(context.relevant_knowledge.len(), 1);
    }

    #[tokio::test]
    async fn test_schema_data_included_when_configured() {
        let store = Arc::new(MockKnowledgeStore::new());
        let history = Arc::new(InMemoryChatHistoryRepository::new());

        let schema = Arc::new(InMemorySchemaSearcher::new());
        schema
            .add(SchemaHit::new(
                SchemaRecordType::Blog,
                "Launch announcement",
                "We are launching a product.",
                "launch-announcement",
            ))
            .await;

        let assembler = ContextAssembler::new(history, retrieval(store), ContextConfig::default())
            .with_schema_searcher(schema);

        let context = assembler
            .build(&project(), &session(), "launching")
            .await
            .unwrap();

        let hits = context.schema_data.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Launch announcement");
    }

    #[tokio::test]
    async fn test_no_schema_searcher_leaves_schema_none() {
        let store = Arc::new(MockKnowledgeStore::new());
        let history = Arc::new(InMemoryChatHistoryRepository::new());

        let assembler =
            ContextAssembler::new(history, retrieval(store), ContextConfig::default());

        let context = assembler
            .build(&project(), &session(), "query")
            .await
            .unwrap();

        assert!(context.schema_data.is_none());
    }

    #[tokio::test]
    async fn test_empty_session_yields_empty_context() {
        let store = Arc::new(MockKnowledgeStore::new());
        let history = Arc::new(InMemoryChatHistoryRepository::new());

        let assembler =
            ContextAssembler::new(history, retrieval(store), ContextConfig::default());

        let context = assembler
            .build(&project(), &session(), "query")
            .await
            .unwrap();

        assert!(context.is_empty());
    }
}
