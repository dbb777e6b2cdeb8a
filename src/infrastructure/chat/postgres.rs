//! PostgreSQL chat repositories

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::chat::{
    Attachment, ChatHistoryRepository, ChatMessage, ChatRole, ChatSession, ChatSessionRepository,
};
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::DomainError;

/// PostgreSQL-backed message log
#[derive(Debug)]
pub struct PostgresChatHistoryRepository {
    pool: PgPool,
}

impl PostgresChatHistoryRepository {
    /// Create a new PostgreSQL history repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the table exists
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id UUID PRIMARY KEY,
                session_id VARCHAR(64) NOT NULL,
                role VARCHAR(16) NOT NULL,
                content TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{}',
                attachments JSONB NOT NULL DEFAULT '[]',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_session \
             ON chat_messages (session_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    fn row_to_message(row: &sqlx::postgres::PgRow) -> Result<ChatMessage, DomainError> {
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let metadata: serde_json::Value = row
            .try_get("metadata")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let attachments: serde_json::Value = row
            .try_get("attachments")
            .map_err(|e| DomainError::storage(e.to_string()))?;

        let role = match role.as_str() {
            "user" => ChatRole::User,
            "assistant" => ChatRole::Assistant,
            other => {
                return Err(DomainError::storage(format!(
                    "Unknown chat role '{}'",
                    other
                )))
            }
        };

        let metadata: HashMap<String, serde_json::Value> = match metadata {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };

        let attachments: Vec<Attachment> =
            serde_json::from_value(attachments).unwrap_or_default();

        Ok(ChatMessage {
            id: row
                .try_get("id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            session_id: SessionId::new(session_id)
                .map_err(|e| DomainError::storage(format!("Corrupt session id: {}", e)))?,
            role,
            content: row
                .try_get("content")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            metadata,
            attachments,
            created_at: row
                .try_get("created_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
        })
    }
}

#[async_trait]
impl ChatHistoryRepository for PostgresChatHistoryRepository {
    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, session_id, role, content, metadata, attachments, created_at \
             FROM chat_messages WHERE session_id = $1 ORDER BY created_at ASC",
        )
        .bind(session_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Query failed: {}", e)))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn append(&self, message: ChatMessage) -> Result<ChatMessage, DomainError> {
        let metadata = serde_json::Value::Object(message.metadata.clone().into_iter().collect());
        let attachments = serde_json::to_value(&message.attachments)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        sqlx::query(
            "INSERT INTO chat_messages (id, session_id, role, content, metadata, attachments, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(message.id)
        .bind(message.session_id.as_str())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(&metadata)
        .bind(&attachments)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Message insert failed: {}", e)))?;

        Ok(message)
    }
}

/// PostgreSQL-backed session store
#[derive(Debug)]
pub struct PostgresChatSessionRepository {
    pool: PgPool,
}

impl PostgresChatSessionRepository {
    /// Create a new PostgreSQL session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the table exists
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id VARCHAR(64) PRIMARY KEY,
                project_id VARCHAR(64) NOT NULL,
                title TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn row_to_session(row: &sqlx::postgres::PgRow) -> Result<ChatSession, DomainError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let project_id: String = row
            .try_get("project_id")
            .map_err(|e| DomainError::storage(e.to_string()))?;

        Ok(ChatSession {
            id: SessionId::new(id)
                .map_err(|e| DomainError::storage(format!("Corrupt session id: {}", e)))?,
            project_id: ProjectId::new(project_id)
                .map_err(|e| DomainError::storage(format!("Corrupt project id: {}", e)))?,
            title: row
                .try_get("title")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            updated_at: row
                .try_get("updated_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
        })
    }
}

#[async_trait]
impl ChatSessionRepository for PostgresChatSessionRepository {
    async fn get(&self, id: &SessionId) -> Result<Option<ChatSession>, DomainError> {
        let row = sqlx::query(
            "SELECT id, project_id, title, created_at, updated_at \
             FROM chat_sessions WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Query failed: {}", e)))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn create(&self, session: ChatSession) -> Result<ChatSession, DomainError> {
        sqlx::query(
            "INSERT INTO chat_sessions (id, project_id, title, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(session.id.as_str())
        .bind(session.project_id.as_str())
        .bind(&session.title)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Session insert failed: {}", e)))?;

        Ok(session)
    }

    async fn list_with_title(
        &self,
        project_id: &ProjectId,
        title: &str,
    ) -> Result<Vec<ChatSession>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, project_id, title, created_at, updated_at \
             FROM chat_sessions WHERE project_id = $1 AND title = $2 \
             ORDER BY updated_at DESC",
        )
        .bind(project_id.as_str())
        .bind(title)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Query failed: {}", e)))?;

        rows.iter().map(Self::row_to_session).collect()
    }

    async fn update_title(&self, id: &SessionId, title: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET title = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(title)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Title update failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Session '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
