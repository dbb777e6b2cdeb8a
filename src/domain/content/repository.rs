//! Content version repository trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::version::{ContentVersion, NewContentVersion};
use crate::domain::error::DomainError;
use crate::domain::ids::{ProjectId, SessionId};

/// Persistence trait for content versions.
///
/// `create` assigns `version_number` atomically: two concurrent creators for
/// the same session must never observe the same maximum. In-memory
/// implementations compute `max + 1` inside a single write critical section;
/// SQL implementations assign it in one statement guarded by a unique
/// `(session_id, version_number)` constraint.
#[async_trait]
pub trait ContentVersionRepository: Send + Sync + Debug {
    /// Insert a new version at `max(version_number) + 1` for its session,
    /// unpublished
    async fn create(&self, new: NewContentVersion) -> Result<ContentVersion, DomainError>;

    /// Fetch a version by id
    async fn get(&self, id: Uuid) -> Result<Option<ContentVersion>, DomainError>;

    /// All versions of a session, newest version number first
    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ContentVersion>, DomainError>;

    /// The session's highest-numbered version
    async fn latest_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<ContentVersion>, DomainError>;

    /// All published versions of a project, most recently published first
    async fn published_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ContentVersion>, DomainError>;

    /// Flip `published = false` on every published version of the
    /// session/project except `exclude`, returning the number changed
    async fn unpublish_others(
        &self,
        session_id: &SessionId,
        project_id: &ProjectId,
        exclude: Uuid,
    ) -> Result<usize, DomainError>;

    /// Set the publish state of one version. `published_at` replaces the
    /// stored value; `document_id` is only written when `Some`;
    /// `touch_updated` refreshes `updated_at`. Errors with `NotFound` when
    /// the version does not exist.
    async fn set_published(
        &self,
        id: Uuid,
        published: bool,
        published_at: Option<DateTime<Utc>>,
        document_id: Option<String>,
        touch_updated: bool,
    ) -> Result<ContentVersion, DomainError>;

    /// Replace the content body and refresh `updated_at`. Errors with
    /// `NotFound` when the version does not exist.
    async fn update_content(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<ContentVersion, DomainError>;
}
