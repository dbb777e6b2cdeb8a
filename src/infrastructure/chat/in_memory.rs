//! In-memory chat repositories for development and testing

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::chat::{
    ChatHistoryRepository, ChatMessage, ChatSession, ChatSessionRepository,
};
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::DomainError;

/// In-memory message log
#[derive(Debug)]
pub struct InMemoryChatHistoryRepository {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl InMemoryChatHistoryRepository {
    /// Create a new in-memory history repository
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryChatHistoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatHistoryRepository for InMemoryChatHistoryRepository {
    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, DomainError> {
        let messages = self.messages.read().await;

        let mut matched: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.session_id == *session_id)
            .cloned()
            .collect();

        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matched)
    }

    async fn append(&self, message: ChatMessage) -> Result<ChatMessage, DomainError> {
        self.messages.write().await.push(message.clone());
        Ok(message)
    }
}

/// In-memory session store
#[derive(Debug)]
pub struct InMemoryChatSessionRepository {
    sessions: Arc<RwLock<Vec<ChatSession>>>,
}

impl InMemoryChatSessionRepository {
    /// Create a new in-memory session repository
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryChatSessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSessionRepository for InMemoryChatSessionRepository {
    async fn get(&self, id: &SessionId) -> Result<Option<ChatSession>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().find(|s| s.id == *id).cloned())
    }

    async fn create(&self, session: ChatSession) -> Result<ChatSession, DomainError> {
        let mut sessions = self.sessions.write().await;

        if sessions.iter().any(|s| s.id == session.id) {
            return Err(DomainError::conflict(format!(
                "Session '{}' already exists",
                session.id
            )));
        }

        sessions.push(session.clone());
        Ok(session)
    }

    async fn list_with_title(
        &self,
        project_id: &ProjectId,
        title: &str,
    ) -> Result<Vec<ChatSession>, DomainError> {
        let sessions = self.sessions.read().await;

        Ok(sessions
            .iter()
            .filter(|s| s.project_id == *project_id && s.title == title)
            .cloned()
            .collect())
    }

    async fn update_title(&self, id: &SessionId, title: &str) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;

        let session = sessions
            .iter_mut()
            .find(|s| s.id == *id)
            .ok_or_else(|| DomainError::not_found(format!("Session '{}' not found", id)))?;

        session.title = title.to_string();
        session.updated_at = Utc::now();

        Ok(())
    }
}
