//! PostgreSQL content version repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::content::{ContentVersion, ContentVersionRepository, NewContentVersion};
use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::DomainError;

const COLUMNS: &str = "id, session_id, project_id, message_id, version_number, title, author, \
     content, published, published_at, document_id, created_at, updated_at";

/// PostgreSQL-backed content version repository.
///
/// The version number is assigned inside the INSERT statement and backed by a
/// unique `(session_id, version_number)` constraint, so racing creators
/// cannot both win the same number.
#[derive(Debug)]
pub struct PostgresContentVersionRepository {
    pool: PgPool,
}

impl PostgresContentVersionRepository {
    /// Create a new PostgreSQL repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the table and indexes exist
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content_versions (
                id UUID PRIMARY KEY,
                session_id VARCHAR(64) NOT NULL,
                project_id VARCHAR(64) NOT NULL,
                message_id UUID NOT NULL,
                version_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                content TEXT NOT NULL,
                published BOOLEAN NOT NULL DEFAULT FALSE,
                published_at TIMESTAMPTZ,
                document_id TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (session_id, version_number)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_content_versions_published \
             ON content_versions (project_id, published)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    fn row_to_version(row: &sqlx::postgres::PgRow) -> Result<ContentVersion, DomainError> {
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let project_id: String = row
            .try_get("project_id")
            .map_err(|e| DomainError::storage(e.to_string()))?;

        Ok(ContentVersion {
            id: row
                .try_get("id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            session_id: SessionId::new(session_id)
                .map_err(|e| DomainError::storage(format!("Corrupt session id: {}", e)))?,
            project_id: ProjectId::new(project_id)
                .map_err(|e| DomainError::storage(format!("Corrupt project id: {}", e)))?,
            message_id: row
                .try_get("message_id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            version_number: row
                .try_get("version_number")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            title: row
                .try_get("title")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            author: row
                .try_get("author")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            content: row
                .try_get("content")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            published: row
                .try_get("published")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            published_at: row
                .try_get("published_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            document_id: row
                .try_get("document_id")
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
impl ContentVersionRepository for PostgresContentVersionRepository {
    async fn create(&self, new: NewContentVersion) -> Result<ContentVersion, DomainError> {
        let query = format!(
            "INSERT INTO content_versions \
                (id, session_id, project_id, message_id, version_number, title, author, content, published) \
             SELECT $1, $2, $3, $4, COALESCE(MAX(version_number), 0) + 1, $5, $6, $7, FALSE \
             FROM content_versions WHERE session_id = $2 \
             RETURNING {}",
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(new.session_id.as_str())
            .bind(new.project_id.as_str())
            .bind(new.message_id)
            .bind(&new.title)
            .bind(&new.author)
            .bind(&new.content)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Version insert failed: {}", e)))?;

        Self::row_to_version(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ContentVersion>, DomainError> {
        let query = format!("SELECT {} FROM content_versions WHERE id = $1", COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Query failed: {}", e)))?;

        row.as_ref().map(Self::row_to_version).transpose()
    }

    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ContentVersion>, DomainError> {
        let query = format!(
            "SELECT {} FROM content_versions WHERE session_id = $1 \
             ORDER BY version_number DESC",
            COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(session_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Query failed: {}", e)))?;

        rows.iter().map(Self::row_to_version).collect()
    }

    async fn latest_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<ContentVersion>, DomainError> {
        let query = format!(
            "SELECT {} FROM content_versions WHERE session_id = $1 \
             ORDER BY version_number DESC LIMIT 1",
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Query failed: {}", e)))?;

        row.as_ref().map(Self::row_to_version).transpose()
    }

    async fn published_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ContentVersion>, DomainError> {
        let query = format!(
            "SELECT {} FROM content_versions \
             WHERE project_id = $1 AND published = TRUE \
             ORDER BY published_at DESC NULLS LAST",
            COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(project_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Query failed: {}", e)))?;

        rows.iter().map(Self::row_to_version).collect()
    }

    async fn unpublish_others(
        &self,
        session_id: &SessionId,
        project_id: &ProjectId,
        exclude: Uuid,
    ) -> Result<usize, DomainError> {
        let result = sqlx::query(
            "UPDATE content_versions SET published = FALSE, updated_at = NOW() \
             WHERE session_id = $1 AND project_id = $2 AND published = TRUE AND id <> $3",
        )
        .bind(session_id.as_str())
        .bind(project_id.as_str())
        .bind(exclude)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Unpublish failed: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn set_published(
        &self,
        id: Uuid,
        published: bool,
        published_at: Option<DateTime<Utc>>,
        document_id: Option<String>,
        touch_updated: bool,
    ) -> Result<ContentVersion, DomainError> {
        let query = format!(
            "UPDATE content_versions SET \
                published = $2, \
                published_at = $3, \
                document_id = COALESCE($4, document_id), \
                updated_at = CASE WHEN $5 THEN NOW() ELSE updated_at END \
             WHERE id = $1 \
             RETURNING {}",
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(published)
            .bind(published_at)
            .bind(document_id)
            .bind(touch_updated)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Publish update failed: {}", e)))?
            .ok_or_else(|| DomainError::not_found(format!("Content version '{}' not found", id)))?;

        Self::row_to_version(&row)
    }

    async fn update_content(
        &self,
        id: Uuid,
        content: &str,
    ) -> Result<ContentVersion, DomainError> {
        let query = format!(
            "UPDATE content_versions SET content = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(content)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Content update failed: {}", e)))?
            .ok_or_else(|| DomainError::not_found(format!("Content version '{}' not found", id)))?;

        Self::row_to_version(&row)
    }
}
