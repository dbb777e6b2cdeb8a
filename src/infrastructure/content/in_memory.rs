//! In-memory content version repository for development and testing

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::content::{ContentVersion, ContentVersionRepository, NewContentVersion};
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::DomainError;

/// In-memory content version repository.
///
/// Version numbering is computed inside the single write critical section, so
/// concurrent `create` calls for the same session cannot assign duplicates.
#[derive(Debug)]
pub struct InMemoryContentVersionRepository {
    versions: Arc<RwLock<Vec<ContentVersion>>>,
}

impl InMemoryContentVersionRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self {
            versions: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryContentVersionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentVersionRepository for InMemoryContentVersionRepository {
    async fn create(&self, new: NewContentVersion) -> Result<ContentVersion, DomainError> {
        let mut versions = self.versions.write().await;

        let max_number = versions
            .iter()
            .filter(|v| v.session_id == new.session_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0);

        let now = Utc::now();
        let version = ContentVersion {
            id: Uuid::new_v4(),
            session_id: new.session_id,
            project_id: new.project_id,
            message_id: new.message_id,
            version_number: max_number + 1,
            title: new.title,
            author: new.author,
            content: new.content,
            published: false,
            published_at: None,
            document_id: None,
            created_at: now,
            updated_at: now,
        };

        versions.push(version.clone());
        Ok(version)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ContentVersion>, DomainError> {
        let versions = self.versions.read().await;
        Ok(versions.iter().find(|v| v.id == id).cloned())
    }

    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ContentVersion>, DomainError> {
        let versions = self.versions.read().await;

        let mut matched: Vec<ContentVersion> = versions
            .iter()
            .filter(|v| v.session_id == *session_id)
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(matched)
    }

    async fn latest_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<ContentVersion>, DomainError> {
        Ok(self.list_for_session(session_id).await?.into_iter().next())
    }

    async fn published_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ContentVersion>, DomainError> {
        let versions = self.versions.read().await;

        let mut matched: Vec<ContentVersion> = versions
            .iter()
            .filter(|v| v.project_id == *project_id && v.published)
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(matched)
    }

    async fn unpublish_others(
        &self,
        session_id: &SessionId,
        project_id: &ProjectId,
        exclude: Uuid,
    ) -> Result<usize, DomainError> {
        let mut versions = self.versions.write().await;
        let mut changed = 0;

        for version in versions.iter_mut() {
            if version.session_id == *session_id
                && version.project_id == *project_id
                && version.published
                && version.id != exclude
            {
                version.published = false;
                version.updated_at = Utc::now();
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn set_published(
        &self,
        id: Uuid,
        published: bool,
        published_at: Option<DateTime<Utc>>,
        document_id: Option<String>,
        touch_updated: bool,
    ) -> Result<ContentVersion, DomainError> {
        let mut versions = self.versions.write().await;

        let version = versions
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| DomainError::not_found(format!("Content version '{}' not found", id)))?;

        version.published = published;
        version.published_at = published_at;

        if document_id.is_some() {
            version.document_id = document_id;
        }

        if touch_updated {
            version.updated_at = Utc::now();
        }

        Ok(version.clone())
    }

    async fn update_content(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<ContentVersion, DomainError> {
        let mut versions = self.versions.write().await;

        let version = versions
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| DomainError::not_found(format!("Content version '{}' not found", id)))?;

        version.content = content.to_string();
        version.updated_at = Utc::now();

        Ok(version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    fn project() -> ProjectId {
        ProjectId::new("p1").unwrap()
    }

    fn new_version(session_id: &str, title: &str) -> NewContentVersion {
        NewContentVersion::new(
            session(session_id),
            project(),
            Uuid::new_v4(),
            title,
            "Author",
            "Body",
        )
    }

    #[tokio::test]
    async fn test_version_numbers_increase_without_gaps() {
        let repo = InMemoryContentVersionRepository::new();

        let v1 = repo.create(new_version("s1", "first")).await.unwrap();
        let v2 = repo.create(new_version("s1", "second")).await.unwrap();
        let v3 = repo.create(new_version("s1", "third")).await.unwrap();

        assert_eq!(v1.version_number, 1);
        assert_eq!(v2.version_number, 2);
        assert_eq!(v3.version_number, 3);
    }

    #[tokio::test]
    async fn test_numbering_is_per_session() {
        let repo = InMemoryContentVersionRepository::new();

        repo.create(new_version("s1", "a")).await.unwrap();
        let other = repo.create(new_version("s2", "b")).await.unwrap();

        assert_eq!(other.version_number, 1);
    }

    #[tokio::test]
    async fn test_list_for_session_newest_first() {
        let repo = InMemoryContentVersionRepository::new();

        repo.create(new_version("s1", "first")).await.unwrap();
        repo.create(new_version("s1", "second")).await.unwrap();

        let versions = repo.list_for_session(&session("s1")).await.unwrap();

        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].title, "second");
        assert_eq!(versions[1].title, "first");
    }

    #[tokio::test]
    async fn test_latest_for_session() {
        let repo = InMemoryContentVersionRepository::new();

        repo.create(new_version("s1", "first")).await.unwrap();
        repo.create(new_version("s1", "second")).await.unwrap();

        let latest = repo.latest_for_session(&session("s1")).await.unwrap();
        assert_eq!(latest.unwrap().title, "second");

        let none = repo.latest_for_session(&session("other")).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_set_published_missing_version() {
        let repo = InMemoryContentVersionRepository::new();

        let result = repo
            .set_published(Uuid::new_v4(), true, Some(Utc::now()), None, false)
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unpublish_others_excludes_given_version() {
        let repo = InMemoryContentVersionRepository::new();

        let v1 = repo.create(new_version("s1", "first")).await.unwrap();
        let v2 = repo.create(new_version("s1", "second")).await.unwrap();

        repo.set_published(v1.id, true, Some(Utc::now()), None, false)
            .await
            .unwrap();
        repo.set_published(v2.id, true, Some(Utc::now()), None, false)
            .await
            .unwrap();

        let changed = repo
            .unpublish_others(&session("s1"), &project(), v2.id)
            .await
            .unwrap();

        assert_eq!(changed, 1);
        assert!(!repo.get(v1.id).await.unwrap().unwrap().published);
        assert!(repo.get(v2.id).await.unwrap().unwrap().published);
    }

    #[tokio::test]
    async fn test_update_content_touches_updated_at() {
        let repo = InMemoryContentVersionRepository::new();

        let v = repo.create(new_version("s1", "draft")).await.unwrap();
        let updated = repo.update_content(v.id, "revised body").await.unwrap();

        assert_eq!(updated.content, "revised body");
        assert!(updated.updated_at >= v.updated_at);
    }
}
