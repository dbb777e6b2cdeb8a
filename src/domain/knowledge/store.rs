//! Knowledge store trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entry::{EntryFilter, EntryPatch, KnowledgeEntry, NewEntry};
use crate::domain::error::DomainError;
use crate::domain::ids::{ProjectId, SessionId};

/// Persistence trait for knowledge base entries.
///
/// Implementations back this with a vector-capable store (pgvector) or an
/// in-memory index. `similarity_search` with `session = None` searches the
/// whole project; a concrete session id scopes the search to that session.
#[async_trait]
pub trait KnowledgeStore: Send + Sync + Debug {
    /// Insert a single entry
    async fn insert(&self, entry: NewEntry) -> Result<KnowledgeEntry, DomainError>;

    /// Insert many entries, returning the number stored
    async fn bulk_insert(&self, entries: Vec<NewEntry>) -> Result<usize, DomainError>;

    /// Update all entries matching the filter, returning the number changed
    async fn update(&self, filter: &EntryFilter, patch: EntryPatch) -> Result<usize, DomainError>;

    /// Delete all entries matching the filter, returning the number removed
    async fn delete(&self, filter: &EntryFilter) -> Result<usize, DomainError>;

    /// Find a single entry matching the filter (first match)
    async fn find_one(&self, filter: &EntryFilter) -> Result<Option<KnowledgeEntry>, DomainError>;

    /// Nearest-neighbor search over the embedding space, ordered by
    /// descending similarity. A higher threshold never widens the result set.
    async fn similarity_search(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, DomainError>;

    /// Direct fetch ordered by `source` ascending then `created_at`
    /// descending - the retrieval fallback ordering that favors published
    /// content first and recency second.
    async fn list_recent(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, DomainError>;
}
