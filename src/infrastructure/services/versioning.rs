//! Content version lifecycle management
//!
//! Owns the draft/publish/unpublish state machine and keeps the knowledge
//! base's `published_content` entries consistent with it. The version rows
//! are the source of truth; the knowledge base is a derived index, so its
//! synchronization failures are logged and swallowed while repository
//! failures propagate.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::content::{ContentVersion, ContentVersionRepository, NewContentVersion};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::knowledge::{
    EntryFilter, EntryPatch, KnowledgeSource, KnowledgeStore, NewEntry,
};
use crate::domain::DomainError;

/// Manages content version state transitions per `(session, project)`.
///
/// Publish and create are serialized per session through an async lock map;
/// version numbering itself is already atomic at the repository, the lock
/// keeps the multi-step supersede-then-publish sequence ordered.
#[derive(Debug)]
pub struct ContentVersionManager {
    versions: Arc<dyn ContentVersionRepository>,
    knowledge: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContentVersionManager {
    /// Create a new content version manager
    pub fn new(
        versions: Arc<dyn ContentVersionRepository>,
        knowledge: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            versions,
            knowledge,
            embedder,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn session_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(session_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Create a new draft version at the session's next version number
    pub async fn create_version(
        &self,
        new: NewContentVersion,
    ) -> Result<ContentVersion, DomainError> {
        let lock = self.session_lock(&new.session_id).await;
        let _guard = lock.lock().await;

        let created = self.versions.create(new).await?;

        info!(
            session = %created.session_id,
            version = created.version_number,
            "stored content version"
        );

        Ok(created)
    }

    /// Fetch a version by id
    pub async fn get_version(&self, id: Uuid) -> Result<Option<ContentVersion>, DomainError> {
        self.versions.get(id).await
    }

    /// All versions of a session, newest first
    pub async fn list_versions(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ContentVersion>, DomainError> {
        self.versions.list_for_session(session_id).await
    }

    /// The session's latest version
    pub async fn latest_version(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<ContentVersion>, DomainError> {
        self.versions.latest_for_session(session_id).await
    }

    /// All published versions of a project
    pub async fn published_versions(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ContentVersion>, DomainError> {
        self.versions.published_for_project(project_id).await
    }

    /// Publish a version as the session's canonical artifact.
    ///
    /// Every other published version of the session is unpublished first and
    /// its `published_content` knowledge entry removed; the version row then
    /// flips to published, and finally the knowledge base is refreshed with
    /// this version's content. Re-publishing the same version leaves exactly
    /// one entry in place.
    pub async fn publish(
        &self,
        version_id: Uuid,
        document_id: Option<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<ContentVersion, DomainError> {
        let version = self
            .versions
            .get(version_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Content version '{}' not found", version_id))
            })?;

        let lock = self.session_lock(&version.session_id).await;
        let _guard = lock.lock().await;

        let superseded = self
            .versions
            .unpublish_others(&version.session_id, &version.project_id, version_id)
            .await?;

        if superseded > 0 {
            info!(
                session = %version.session_id,
                count = superseded,
                "unpublished previous versions"
            );

            if let Err(err) = self
                .remove_published_entry(&version.project_id, &version.session_id)
                .await
            {
                warn!(%err, "failed to remove superseded content from knowledge base");
            }
        }

        let published_at = published_at.unwrap_or_else(Utc::now);
        let published = self
            .versions
            .set_published(version_id, true, Some(published_at), document_id, false)
            .await?;

        if let Err(err) = self.sync_published_entry(&published).await {
            warn!(%err, "failed to sync published content into knowledge base");
        }

        info!(
            version = %version_id,
            session = %published.session_id,
            "content version published"
        );

        Ok(published)
    }

    /// Return a published version to draft and drop its knowledge entry, so
    /// retrieval can no longer surface de-published content
    pub async fn unpublish(&self, version_id: Uuid) -> Result<ContentVersion, DomainError> {
        let version = self
            .versions
            .get(version_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Content version '{}' not found", version_id))
            })?;

        let lock = self.session_lock(&version.session_id).await;
        let _guard = lock.lock().await;

        let draft = self
            .versions
            .set_published(version_id, false, None, None, true)
            .await?;

        if let Err(err) = self
            .remove_published_entry(&draft.project_id, &draft.session_id)
            .await
        {
            warn!(%err, "failed to remove unpublished content from knowledge base");
        }

        Ok(draft)
    }

    /// Replace a version's content. A published version's knowledge entry is
    /// refreshed with the new content and a fresh embedding, so the store
    /// never diverges from the authoritative row.
    pub async fn update_content(
        &self,
        version_id: Uuid,
        content: &str,
    ) -> Result<ContentVersion, DomainError> {
        let updated = self.versions.update_content(version_id, content).await?;

        if updated.published {
            if let Err(err) = self.sync_published_entry(&updated).await {
                warn!(%err, "failed to refresh published content in knowledge base");
            }
        }

        Ok(updated)
    }

    fn published_entry_filter(project_id: &ProjectId, session_id: &SessionId) -> EntryFilter {
        EntryFilter::for_project(project_id.clone())
            .with_session(session_id.clone())
            .with_source(KnowledgeSource::PublishedContent)
    }

    fn published_entry_metadata(version: &ContentVersion) -> HashMap<String, serde_json::Value> {
        let mut metadata = HashMap::new();
        metadata.insert(
            "title".to_string(),
            serde_json::Value::String(version.title.clone()),
        );
        metadata.insert(
            "author".to_string(),
            serde_json::Value::String(version.author.clone()),
        );
        metadata.insert(
            "content_version_id".to_string(),
            serde_json::Value::String(version.id.to_string()),
        );
        metadata
    }

    /// Upsert the single `published_content` entry for the version's
    /// `(project, session)` key
    async fn sync_published_entry(&self, version: &ContentVersion) -> Result<(), DomainError> {
        let embedding = self.embedder.embed(&version.content).await?;
        let filter = Self::published_entry_filter(&version.project_id, &version.session_id);
        let metadata = Self::published_entry_metadata(version);

        if self.knowledge.find_one(&filter).await?.is_some() {
            self.knowledge
                .update(
                    &filter,
                    EntryPatch::new()
                        .with_content(version.content.clone())
                        .with_metadata(metadata)
                        .with_embedding(embedding),
                )
                .await?;
        } else {
            self.knowledge
                .insert(
                    NewEntry::new(
                        version.project_id.clone(),
                        version.content.clone(),
                        KnowledgeSource::PublishedContent,
                        embedding,
                    )
                    .with_session(version.session_id.clone())
                    .with_all_metadata(metadata),
                )
                .await?;
        }

        Ok(())
    }

    async fn remove_published_entry(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
    ) -> Result<usize, DomainError> {
        self.knowledge
            .delete(&Self::published_entry_filter(project_id, session_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::mock::MockEmbeddingProvider;
    use crate::domain::knowledge::mock::MockKnowledgeStore;
    use crate::infrastructure::content::InMemoryContentVersionRepository;
    use crate::infrastructure::knowledge::InMemoryKnowledgeStore;

    fn session(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    fn project() -> ProjectId {
        ProjectId::new("p1").unwrap()
    }

    fn new_version(session_id: &str, title: &str, content: &str) -> NewContentVersion {
        NewContentVersion::new(
            session(session_id),
            project(),
            Uuid::new_v4(),
            title,
            "Author",
            content,
        )
    }

    fn manager_with_store(
        knowledge: Arc<dyn KnowledgeStore>,
    ) -> (ContentVersionManager, Arc<InMemoryContentVersionRepository>) {
        let versions = Arc::new(InMemoryContentVersionRepository::new());
        let manager = ContentVersionManager::new(
            versions.clone(),
            knowledge,
            Arc::new(MockEmbeddingProvider::new(8)),
        );
        (manager, versions)
    }

    async fn published_entries(store: &InMemoryKnowledgeStore, session_id: &str) -> usize {
        store
            .list_recent(&project(), Some(&session(session_id)), 100)
            .await
            .unwrap()
            .iter()
            .filter(|e| e.source == KnowledgeSource::PublishedContent)
            .count()
    }

    #[tokio::test]
    async fn test_sequential_version_numbering() {
        let (manager, _) = manager_with_store(Arc::new(InMemoryKnowledgeStore::new()));

        for expected in 1..=4 {
            let version = manager
                .create_version(new_version("s1", "draft", "text"))
                .await
                .unwrap();
            assert_eq!(version.version_number, expected);
            assert!(!version.published);
        }
    }

    #[tokio::test]
    async fn test_publish_supersedes_previous_version() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (manager, _) = manager_with_store(store.clone());

        let v1 = manager
            .create_version(new_version("s1", "first", "first body"))
            .await
            .unwrap();
        let v2 = manager
            .create_version(new_version("s1", "second", "second body"))
            .await
            .unwrap();

        manager.publish(v1.id, None, None).await.unwrap();
        manager
            .publish(v2.id, Some("doc-42".to_string()), None)
            .await
            .unwrap();

        let v1 = manager.get_version(v1.id).await.unwrap().unwrap();
        let v2 = manager.get_version(v2.id).await.unwrap().unwrap();

        assert!(!v1.published);
        assert!(v2.published);
        assert_eq!(v2.document_id.as_deref(), Some("doc-42"));

        assert_eq!(published_entries(&store, "s1").await, 1);

        let entry = store
            .find_one(
                &EntryFilter::for_project(project())
                    .with_session(session("s1"))
                    .with_source(KnowledgeSource::PublishedContent),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.content, "second body");
    }

    #[tokio::test]
    async fn test_republish_is_idempotent() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (manager, _) = manager_with_store(store.clone());

        let v1 = manager
            .create_version(new_version("s1", "only", "body"))
            .await
            .unwrap();

        manager.publish(v1.id, None, None).await.unwrap();
        manager.publish(v1.id, None, None).await.unwrap();

        assert_eq!(published_entries(&store, "s1").await, 1);
        assert!(manager.get_version(v1.id).await.unwrap().unwrap().published);
    }

    #[tokio::test]
    async fn test_at_most_one_published_per_session() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (manager, _) = manager_with_store(store);

        let mut ids = Vec::new();
        for i in 0..3 {
            let v = manager
                .create_version(new_version("s1", "draft", &format!("body {}", i)))
                .await
                .unwrap();
            ids.push(v.id);
        }

        for id in &ids {
            manager.publish(*id, None, None).await.unwrap();

            let published: Vec<_> = manager
                .list_versions(&session("s1"))
                .await
                .unwrap()
                .into_iter()
                .filter(|v| v.published)
                .collect();

            assert_eq!(published.len(), 1);
            assert_eq!(published[0].id, *id);
        }
    }

    #[tokio::test]
    async fn test_publish_survives_knowledge_store_failure() {
        let store = Arc::new(MockKnowledgeStore::new());
        store.set_fail_all(true).await;
        let (manager, _) = manager_with_store(store);

        let v1 = manager
            .create_version(new_version("s1", "draft", "body"))
            .await
            .unwrap();

        let published = manager.publish(v1.id, None, None).await.unwrap();
        assert!(published.published);
        assert!(published.published_at.is_some());
    }

    #[tokio::test]
    async fn test_publish_survives_embedding_failure() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let versions = Arc::new(InMemoryContentVersionRepository::new());
        let manager = ContentVersionManager::new(
            versions,
            store.clone(),
            Arc::new(MockEmbeddingProvider::new(8).with_error("embedding service down")),
        );

        let v1 = manager
            .create_version(new_version("s1", "draft", "body"))
            .await
            .unwrap();

        let published = manager.publish(v1.id, None, None).await.unwrap();

        assert!(published.published);
        // The derived index is missing the entry, but the state transition held.
        assert_eq!(published_entries(&store, "s1").await, 0);
    }

    #[tokio::test]
    async fn test_publish_missing_version_is_client_error() {
        let (manager, _) = manager_with_store(Arc::new(InMemoryKnowledgeStore::new()));

        let result = manager.publish(Uuid::new_v4(), None, None).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unpublish_deletes_knowledge_entry() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (manager, _) = manager_with_store(store.clone());

        let v1 = manager
            .create_version(new_version("s1", "draft", "body"))
            .await
            .unwrap();

        manager.publish(v1.id, None, None).await.unwrap();
        assert_eq!(published_entries(&store, "s1").await, 1);

        let draft = manager.unpublish(v1.id).await.unwrap();

        assert!(!draft.published);
        assert!(draft.published_at.is_none());
        assert_eq!(published_entries(&store, "s1").await, 0);
    }

    #[tokio::test]
    async fn test_update_content_refreshes_published_entry() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (manager, _) = manager_with_store(store.clone());

        let v1 = manager
            .create_version(new_version("s1", "draft", "original"))
            .await
            .unwrap();
        manager.publish(v1.id, None, None).await.unwrap();

        let updated = manager.update_content(v1.id, "revised").await.unwrap();
        assert_eq!(updated.content, "revised");

        let entry = store
            .find_one(
                &EntryFilter::for_project(project())
                    .with_session(session("s1"))
                    .with_source(KnowledgeSource::PublishedContent),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entry.content, "revised");
        assert_eq!(published_entries(&store, "s1").await, 1);
    }

    #[tokio::test]
    async fn test_update_content_on_draft_leaves_knowledge_alone() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (manager, _) = manager_with_store(store.clone());

        let v1 = manager
            .create_version(new_version("s1", "draft", "original"))
            .await
            .unwrap();

        manager.update_content(v1.id, "revised").await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sessions_do_not_interfere() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (manager, _) = manager_with_store(store.clone());

        let a = manager
            .create_version(new_version("s1", "a", "a body"))
            .await
            .unwrap();
        let b = manager
            .create_version(new_version("s2", "b", "b body"))
            .await
            .unwrap();

        manager.publish(a.id, None, None).await.unwrap();
        manager.publish(b.id, None, None).await.unwrap();

        assert!(manager.get_version(a.id).await.unwrap().unwrap().published);
        assert!(manager.get_version(b.id).await.unwrap().unwrap().published);
        assert_eq!(published_entries(&store, "s1").await, 1);
        assert_eq!(published_entries(&store, "s2").await, 1);
    }
}
