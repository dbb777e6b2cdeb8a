//! Chat session and message read model
//!
//! The core consumes chat history read-only; appending messages is the
//! surrounding layer's responsibility. `append` exists on the trait so hosts
//! and tests can populate histories through the same seam.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::ids::{ProjectId, SessionId};

/// Title given to sessions before one is generated from the conversation
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// File attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
}

/// A single message in a session's ordered log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: SessionId,
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new message stamped now
    pub fn new(session_id: SessionId, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            role,
            content: content.into(),
            metadata: HashMap::new(),
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach a file reference
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Whether the user attached any files to this message
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// A chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub project_id: ProjectId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a session with the default title
    pub fn new(id: SessionId, project_id: ProjectId) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            title: DEFAULT_SESSION_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Read access to a session's message log
#[async_trait]
pub trait ChatHistoryRepository: Send + Sync + Debug {
    /// All messages of a session, ascending by creation time
    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, DomainError>;

    /// Append a message to the log
    async fn append(&self, message: ChatMessage) -> Result<ChatMessage, DomainError>;
}

/// Access to chat sessions
#[async_trait]
pub trait ChatSessionRepository: Send + Sync + Debug {
    /// Fetch a session by id
    async fn get(&self, id: &SessionId) -> Result<Option<ChatSession>, DomainError>;

    /// Create a session
    async fn create(&self, session: ChatSession) -> Result<ChatSession, DomainError>;

    /// Sessions of a project still carrying the given placeholder title
    async fn list_with_title(
        &self,
        project_id: &ProjectId,
        title: &str,
    ) -> Result<Vec<ChatSession>, DomainError>;

    /// Replace a session's title. Errors with `NotFound` when missing.
    async fn update_title(&self, id: &SessionId, title: &str) -> Result<(), DomainError>;
}
