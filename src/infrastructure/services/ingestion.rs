//! Document ingestion into the knowledge base

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::ingestion::{ChunkerConfig, ChunkingStrategy};
use crate::domain::knowledge::{EntryFilter, KnowledgeSource, KnowledgeStore, NewEntry};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::parsers::{ParserFactory, ParserKind};

/// One piece of content to ingest
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub content: String,
    pub source: KnowledgeSource,
    pub metadata: HashMap<String, serde_json::Value>,
    pub content_type: Option<String>,
}

impl ContentItem {
    pub fn new(content: impl Into<String>, source: KnowledgeSource) -> Self {
        Self {
            content: content.into(),
            source,
            metadata: HashMap::new(),
            content_type: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Hint the input format so the right parser runs before chunking
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Parses, chunks and embeds content, then stores it in the knowledge base.
///
/// Content longer than the configured chunk size is split; each stored chunk
/// carries `chunk_index` / `total_chunks` metadata. Chunk embeddings for one
/// item are produced in a single batch call.
#[derive(Debug)]
pub struct IngestionService {
    store: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn ChunkingStrategy>,
    chunker_config: ChunkerConfig,
}

impl IngestionService {
    /// Create a new ingestion service
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: Arc<dyn ChunkingStrategy>,
        chunker_config: ChunkerConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            chunker,
            chunker_config,
        }
    }

    /// Ingest one item, returning the number of entries stored
    pub async fn ingest(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        item: ContentItem,
    ) -> Result<usize, DomainError> {
        let entries = self.prepare_entries(project_id, session_id, item)?;

        if entries.is_empty() {
            return Ok(0);
        }

        let entries = self.embed_entries(entries).await?;
        let stored = self.store.bulk_insert(entries).await?;

        debug!(project = %project_id, stored, "ingested content item");
        Ok(stored)
    }

    /// Ingest many items in one pass: all chunks are embedded together and
    /// stored with a single bulk insert
    pub async fn ingest_bulk(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        items: Vec<ContentItem>,
    ) -> Result<usize, DomainError> {
        info!(project = %project_id, items = items.len(), "storing items to knowledge base");

        let mut pending = Vec::new();
        for item in items {
            pending.extend(self.prepare_entries(project_id, session_id, item)?);
        }

        if pending.is_empty() {
            return Ok(0);
        }

        let entries = self.embed_entries(pending).await?;
        let stored = self.store.bulk_insert(entries).await?;

        info!(project = %project_id, stored, "stored items to knowledge base");
        Ok(stored)
    }

    /// Delete stale assistant-generated entries for a project, returning the
    /// number removed
    pub async fn cleanup_generated(&self, project_id: &ProjectId) -> Result<usize, DomainError> {
        let deleted = self
            .store
            .delete(
                &EntryFilter::for_project(project_id.clone())
                    .with_source(KnowledgeSource::GeneratedContent),
            )
            .await?;

        info!(project = %project_id, deleted, "cleaned up generated content entries");
        Ok(deleted)
    }

    /// Parse and chunk one item into entries still missing embeddings
    fn prepare_entries(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        item: ContentItem,
    ) -> Result<Vec<NewEntry>, DomainError> {
        let parser_kind = item
            .content_type
            .as_deref()
            .map(ParserKind::from_content_type)
            .unwrap_or_default();
        let parser = ParserFactory::create(parser_kind);

        let text = parser.parse(&item.content)?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let chunks = if text.chars().count() > self.chunker_config.max_chunk_size {
            self.chunker.chunk(&text, &self.chunker_config)?
        } else {
            vec![text]
        };

        let total_chunks = chunks.len();
        let chunked = total_chunks > 1;

        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let mut metadata = item.metadata.clone();
                if chunked {
                    metadata.insert("chunk_index".to_string(), serde_json::json!(index));
                    metadata.insert("total_chunks".to_string(), serde_json::json!(total_chunks));
                }

                let entry = NewEntry::new(project_id.clone(), chunk, item.source, Vec::new())
                    .with_all_metadata(metadata);

                match session_id {
                    Some(session) => entry.with_session(session.clone()),
                    None => entry,
                }
            })
            .collect())
    }

    /// Fill in embeddings for prepared entries with one batch call
    async fn embed_entries(&self, entries: Vec<NewEntry>) -> Result<Vec<NewEntry>, DomainError> {
        let texts: Vec<String> = entries.iter().map(|e| e.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        Ok(entries
            .into_iter()
            .zip(embeddings)
            .map(|(mut entry, embedding)| {
                entry.embedding = embedding;
                entry
            })
            .collect())
    }
}
