//! Content version entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ids::{ProjectId, SessionId};

/// A draft or published snapshot of generated content, tied to a chat session.
///
/// `version_number` starts at 1 and is strictly increasing per session; it is
/// assigned once at creation and never reused. At most one version per
/// `(session_id, project_id)` is published at any moment - the publish
/// transition enforces this, not the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentVersion {
    /// Unique identifier
    pub id: Uuid,
    /// Owning chat session
    pub session_id: SessionId,
    /// Owning project
    pub project_id: ProjectId,
    /// Chat message that produced this version
    pub message_id: Uuid,
    /// Sequence number within the session, starting at 1
    pub version_number: i32,
    /// Content title
    pub title: String,
    /// Attributed author
    pub author: String,
    /// Content body
    pub content: String,
    /// Whether this version is the session's published artifact
    pub published: bool,
    /// When the version was last published
    pub published_at: Option<DateTime<Utc>>,
    /// External reference to the published document, when one exists
    pub document_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContentVersion {
    /// Whether this version can still be published (it always can; publishing
    /// an already-published version is an idempotent refresh)
    pub fn is_published(&self) -> bool {
        self.published
    }
}

/// Data for creating a content version. The repository assigns the id,
/// version number and timestamps.
#[derive(Debug, Clone)]
pub struct NewContentVersion {
    pub session_id: SessionId,
    pub project_id: ProjectId,
    pub message_id: Uuid,
    pub title: String,
    pub author: String,
    pub content: String,
}

impl NewContentVersion {
    pub fn new(
        session_id: SessionId,
        project_id: ProjectId,
        message_id: Uuid,
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            project_id,
            message_id,
            title: title.into(),
            author: author.into(),
            content: content.into(),
        }
    }
}
