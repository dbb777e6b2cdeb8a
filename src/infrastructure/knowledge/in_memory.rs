//! In-memory knowledge store for development and testing

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::knowledge::{
    EntryFilter, EntryPatch, KnowledgeEntry, KnowledgeStore, NewEntry,
};
use crate::domain::DomainError;

/// In-memory knowledge store with real cosine similarity search
#[derive(Debug)]
pub struct InMemoryKnowledgeStore {
    entries: Arc<RwLock<Vec<KnowledgeEntry>>>,
}

impl InMemoryKnowledgeStore {
    /// Create a new in-memory knowledge store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of entries currently stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn in_scope(
        entry: &KnowledgeEntry,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
    ) -> bool {
        if entry.project_id != *project_id {
            return false;
        }
        match session_id {
            Some(session) => entry.session_id.as_ref() == Some(session),
            None => true,
        }
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity between two vectors; 0 when either has no magnitude
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn insert(&self, entry: NewEntry) -> Result<KnowledgeEntry, DomainError> {
        let stored = KnowledgeEntry {
            id: Uuid::new_v4(),
            project_id: entry.project_id,
            session_id: entry.session_id,
            content: entry.content,
            source: entry.source,
            metadata: entry.metadata,
            embedding: entry.embedding,
            created_at: Utc::now(),
        };

        self.entries.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn bulk_insert(&self, entries: Vec<NewEntry>) -> Result<usize, DomainError> {
        let count = entries.len();
        let mut guard = self.entries.write().await;

        for entry in entries {
            guard.push(KnowledgeEntry {
                id: Uuid::new_v4(),
                project_id: entry.project_id,
                session_id: entry.session_id,
                content: entry.content,
                source: entry.source,
                metadata: entry.metadata,
                embedding: entry.embedding,
                created_at: Utc::now(),
            });
        }

        Ok(count)
    }

    async fn update(&self, filter: &EntryFilter, patch: EntryPatch) -> Result<usize, DomainError> {
        let mut entries = self.entries.write().await;
        let mut changed = 0;

        for entry in entries.iter_mut().filter(|e| filter.matches(e)) {
            if let Some(ref content) = patch.content {
                entry.content = content.clone();
            }
            if let Some(ref metadata) = patch.metadata {
                entry.metadata = metadata.clone();
            }
            if let Some(ref embedding) = patch.embedding {
                entry.embedding = embedding.clone();
            }
            changed += 1;
        }

        Ok(changed)
    }

    async fn delete(&self, filter: &EntryFilter) -> Result<usize, DomainError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();

        entries.retain(|e| !filter.matches(e));

        Ok(before - entries.len())
    }

    async fn find_one(&self, filter: &EntryFilter) -> Result<Option<KnowledgeEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| filter.matches(e)).cloned())
    }

    async fn similarity_search(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, DomainError> {
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, KnowledgeEntry)> = entries
            .iter()
            .filter(|e| Self::in_scope(e, project_id, session_id))
            .map(|e| (cosine_similarity(&e.embedding, embedding), e.clone()))
            .filter(|(score, _)| *score >= threshold)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, e)| e).collect())
    }

    async fn list_recent(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, DomainError> {
        let entries = self.entries.read().await;

        let mut matched: Vec<KnowledgeEntry> = entries
            .iter()
            .filter(|e| Self::in_scope(e, project_id, session_id))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then(b.created_at.cmp(&a.created_at))
        });
        matched.truncate(limit);

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge::KnowledgeSource;

    fn project() -> ProjectId {
        ProjectId::new("p1").unwrap()
    }

    fn session(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    fn entry_with_embedding(content: &str, embedding: Vec<f32>) -> NewEntry {
        NewEntry::new(project(), content, KnowledgeSource::UserUpload, embedding)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryKnowledgeStore::new();

        store
            .insert(entry_with_embedding("hello", vec![1.0, 0.0]))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);

        let found = store
            .find_one(&EntryFilter::for_project(project()))
            .await
            .unwrap();
        assert_eq!(found.unwrap().content, "hello");
    }

    #[tokio::test]
    async fn test_similarity_search_orders_by_score() {
        let store = InMemoryKnowledgeStore::new();

        store
            .insert(entry_with_embedding("exact", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .insert(entry_with_embedding("close", vec![0.9, 0.3]))
            .await
            .unwrap();
        store
            .insert(entry_with_embedding("orthogonal", vec![0.0, 1.0]))
            .await
            .unwrap();

        let results = store
            .similarity_search(&project(), None, &[1.0, 0.0], 0.5, 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "exact");
        assert_eq!(results[1].content, "close");
    }

    #[tokio::test]
    async fn test_higher_threshold_never_widens_results() {
        let store = InMemoryKnowledgeStore::new();

        store
            .insert(entry_with_embedding("a", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .insert(entry_with_embedding("b", vec![0.7, 0.7]))
            .await
            .unwrap();
        store
            .insert(entry_with_embedding("c", vec![0.0, 1.0]))
            .await
            .unwrap();

        let query = [1.0, 0.0];
        let loose = store
            .similarity_search(&project(), None, &query, 0.0, 10)
            .await
            .unwrap();
        let mid = store
            .similarity_search(&project(), None, &query, 0.5, 10)
            .await
            .unwrap();
        let tight = store
            .similarity_search(&project(), None, &query, 0.95, 10)
            .await
            .unwrap();

        assert!(loose.len() >= mid.len());
        assert!(mid.len() >= tight.len());
        assert_eq!(tight.len(), 1);
    }

    #[tokio::test]
    async fn test_session_scoping() {
        let store = InMemoryKnowledgeStore::new();

        store
            .insert(
                entry_with_embedding("session entry", vec![1.0, 0.0]).with_session(session("s1")),
            )
            .await
            .unwrap();
        store
            .insert(entry_with_embedding("project entry", vec![1.0, 0.0]))
            .await
            .unwrap();

        let session_id = session("s1");
        let scoped = store
            .similarity_search(&project(), Some(&session_id), &[1.0, 0.0], 0.0, 10)
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].content, "session entry");

        let project_wide = store
            .similarity_search(&project(), None, &[1.0, 0.0], 0.0, 10)
            .await
            .unwrap();
        assert_eq!(project_wide.len(), 2);
    }

    #[tokio::test]
    async fn test_list_recent_orders_by_source_then_recency() {
        let store = InMemoryKnowledgeStore::new();

        store
            .insert(NewEntry::new(
                project(),
                "scraped",
                KnowledgeSource::WebScraping,
                vec![0.0],
            ))
            .await
            .unwrap();
        store
            .insert(NewEntry::new(
                project(),
                "published",
                KnowledgeSource::PublishedContent,
                vec![0.0],
            ))
            .await
            .unwrap();
        store
            .insert(NewEntry::new(
                project(),
                "uploaded",
                KnowledgeSource::UserUpload,
                vec![0.0],
            ))
            .await
            .unwrap();

        let results = store.list_recent(&project(), None, 10).await.unwrap();

        assert_eq!(results[0].content, "published");
        assert_eq!(results[1].content, "uploaded");
        assert_eq!(results[2].content, "scraped");
    }

    #[tokio::test]
    async fn test_update_by_filter() {
        let store = InMemoryKnowledgeStore::new();

        store
            .insert(
                NewEntry::new(
                    project(),
                    "old",
                    KnowledgeSource::PublishedContent,
                    vec![0.1],
                )
                .with_session(session("s1")),
            )
            .await
            .unwrap();

        let filter = EntryFilter::for_project(project())
            .with_session(session("s1"))
            .with_source(KnowledgeSource::PublishedContent);

        let changed = store
            .update(
                &filter,
                EntryPatch::new()
                    .with_content("new")
                    .with_embedding(vec![0.9]),
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let entry = store.find_one(&filter).await.unwrap().unwrap();
        assert_eq!(entry.content, "new");
        assert_eq!(entry.embedding, vec![0.9]);
    }

    #[tokio::test]
    async fn test_delete_by_source() {
        let store = InMemoryKnowledgeStore::new();

        store
            .insert(NewEntry::new(
                project(),
                "generated",
                KnowledgeSource::GeneratedContent,
                vec![0.0],
            ))
            .await
            .unwrap();
        store
            .insert(NewEntry::new(
                project(),
                "kept",
                KnowledgeSource::UserUpload,
                vec![0.0],
            ))
            .await
            .unwrap();

        let deleted = store
            .delete(
                &EntryFilter::for_project(project()).with_source(KnowledgeSource::GeneratedContent),
            )
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
