//! Knowledge retrieval pipeline with cascading fallbacks

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::knowledge::{KnowledgeEntry, KnowledgeSource, KnowledgeStore};

/// Retrieval tuning knobs
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Similarity threshold for project-wide search
    #[serde(default = "default_project_threshold")]
    pub project_threshold: f32,
    /// Similarity threshold for session-scoped search; lower, since freshly
    /// uploaded material must surface even when poorly ranked
    #[serde(default = "default_session_threshold")]
    pub session_threshold: f32,
    /// Result count when the caller does not specify one
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

fn default_project_threshold() -> f32 {
    0.3
}

fn default_session_threshold() -> f32 {
    0.2
}

fn default_limit() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            project_threshold: default_project_threshold(),
            session_threshold: default_session_threshold(),
            default_limit: default_limit(),
        }
    }
}

/// Orchestrates embedding a query and searching the knowledge store, with a
/// cascading fallback policy:
///
/// 1. embed the query and run similarity search; a transport or store error
///    falls through to
/// 2. a direct fetch ordered by source then recency, limited to `limit`;
/// 3. when step 1 succeeded but matched nothing, the direct fetch is
///    broadened to `limit * 2`.
///
/// Retrieval never raises: it returns an empty sequence only when the store
/// is unreachable at every step.
#[derive(Debug)]
pub struct RetrievalPipeline {
    store: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl RetrievalPipeline {
    /// Create a new retrieval pipeline
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    /// Project-wide retrieval
    pub async fn retrieve(
        &self,
        project_id: &ProjectId,
        query: &str,
        limit: Option<usize>,
    ) -> Vec<KnowledgeEntry> {
        let limit = limit.unwrap_or(self.config.default_limit);
        self.retrieve_scoped(project_id, None, query, limit, self.config.project_threshold)
            .await
    }

    /// Session-scoped retrieval; the session id is mandatory and the
    /// threshold defaults lower
    pub async fn retrieve_session(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
        query: &str,
        limit: Option<usize>,
    ) -> Vec<KnowledgeEntry> {
        let limit = limit.unwrap_or(self.config.default_limit);
        self.retrieve_scoped(
            project_id,
            Some(session_id),
            query,
            limit,
            self.config.session_threshold,
        )
        .await
    }

    async fn retrieve_scoped(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        query: &str,
        limit: usize,
        threshold: f32,
    ) -> Vec<KnowledgeEntry> {
        debug!(project = %project_id, query, "retrieving knowledge");

        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(%err, "query embedding failed, falling back to direct fetch");
                return self.direct_fetch(project_id, session_id, limit).await;
            }
        };

        match self
            .store
            .similarity_search(project_id, session_id, &embedding, threshold, limit)
            .await
        {
            Ok(results) if !results.is_empty() => {
                debug!(
                    count = results.len(),
                    published = results
                        .iter()
                        .filter(|e| e.source == KnowledgeSource::PublishedContent)
                        .count(),
                    "similarity search matched"
                );
                results
            }
            Ok(_) => {
                debug!("no matches above threshold, broadening direct fetch");
                self.direct_fetch(project_id, session_id, limit * 2).await
            }
            Err(err) => {
                warn!(%err, "similarity search failed, falling back to direct fetch");
                self.direct_fetch(project_id, session_id, limit).await
            }
        }
    }

    async fn direct_fetch(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> Vec<KnowledgeEntry> {
        match self.store.list_recent(project_id, session_id, limit).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(%err, "direct fetch failed, returning no knowledge");
                Vec::new()
            }
        }
    }
}
