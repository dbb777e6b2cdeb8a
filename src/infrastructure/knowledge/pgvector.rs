//! pgvector knowledge store implementation

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::ids::{ProjectId, SessionId};
use crate::domain::knowledge::{
    EntryFilter, EntryPatch, KnowledgeEntry, KnowledgeSource, KnowledgeStore, NewEntry,
};
use crate::domain::DomainError;

/// Configuration for the pgvector store
#[derive(Debug, Clone)]
pub struct PgvectorConfig {
    /// Embedding dimensions
    pub dimensions: u32,
    /// Table name for storing entries
    pub table_name: String,
}

impl PgvectorConfig {
    /// Create a new pgvector configuration
    pub fn new(dimensions: u32) -> Self {
        Self {
            dimensions,
            table_name: "knowledge_base_entries".to_string(),
        }
    }

    /// Set the table name
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }
}

/// pgvector-backed knowledge store using cosine distance
#[derive(Debug)]
pub struct PgvectorKnowledgeStore {
    pool: PgPool,
    config: PgvectorConfig,
}

impl PgvectorKnowledgeStore {
    /// Create a new pgvector knowledge store
    pub fn new(pool: PgPool, config: PgvectorConfig) -> Self {
        Self { pool, config }
    }

    /// Ensure the vector extension, table and indexes exist
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!("Failed to create vector extension: {}", e))
            })?;

        let table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                project_id VARCHAR(64) NOT NULL,
                session_id VARCHAR(64),
                content TEXT NOT NULL,
                source VARCHAR(32) NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}',
                embedding vector({}) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.config.table_name, self.config.dimensions
        );

        sqlx::query(&table)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Failed to create table: {}", e)))?;

        let scope_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_scope ON {} (project_id, session_id, source)",
            self.config.table_name, self.config.table_name
        );

        sqlx::query(&scope_index)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!("Failed to create scope index: {}", e))
            })?;

        // IVFFlat needs existing rows to build, so a failure here is fine
        let vector_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_embedding ON {} USING ivfflat (embedding vector_cosine_ops)",
            self.config.table_name, self.config.table_name
        );
        let _ = sqlx::query(&vector_index).execute(&self.pool).await;

        Ok(())
    }

    fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<KnowledgeEntry, DomainError> {
        let project_id: String = row
            .try_get("project_id")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let session_id: Option<String> = row
            .try_get("session_id")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let source_tag: String = row
            .try_get("source")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let metadata: serde_json::Value = row
            .try_get("metadata")
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let embedding_text: String = row
            .try_get("embedding_text")
            .map_err(|e| DomainError::storage(e.to_string()))?;

        let project_id = ProjectId::new(project_id)
            .map_err(|e| DomainError::storage(format!("Corrupt project id: {}", e)))?;

        let session_id = session_id
            .map(SessionId::new)
            .transpose()
            .map_err(|e| DomainError::storage(format!("Corrupt session id: {}", e)))?;

        let source = KnowledgeSource::parse(&source_tag).ok_or_else(|| {
            DomainError::storage(format!("Unknown knowledge source tag '{}'", source_tag))
        })?;

        let metadata: HashMap<String, serde_json::Value> = match metadata {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };

        Ok(KnowledgeEntry {
            id: row
                .try_get("id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            project_id,
            session_id,
            content: row
                .try_get("content")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            source,
            metadata,
            embedding: parse_vector(&embedding_text)?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
        })
    }

    const ENTRY_COLUMNS: &'static str = "id, project_id, session_id, content, source, metadata, \
         embedding::text AS embedding_text, created_at";

    fn select_columns(&self) -> String {
        format!("{} FROM {}", Self::ENTRY_COLUMNS, self.config.table_name)
    }
}

/// Render a vector in pgvector's `[x,y,z]` literal form
pub(crate) fn vector_literal(embedding: &[f32]) -> String {
    let parts: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Parse pgvector's `[x,y,z]` text form back into a vector
pub(crate) fn parse_vector(text: &str) -> Result<Vec<f32>, DomainError> {
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| DomainError::storage(format!("Corrupt embedding value: {}", e)))
        })
        .collect()
}

#[async_trait]
impl KnowledgeStore for PgvectorKnowledgeStore {
    async fn insert(&self, entry: NewEntry) -> Result<KnowledgeEntry, DomainError> {
        let query = format!(
            "INSERT INTO {} (id, project_id, session_id, content, source, metadata, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6, $7::vector) \
             RETURNING {}",
            self.config.table_name,
            Self::ENTRY_COLUMNS,
        );

        let metadata = serde_json::Value::Object(entry.metadata.clone().into_iter().collect());

        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(entry.project_id.as_str())
            .bind(entry.session_id.as_ref().map(|s| s.as_str()))
            .bind(&entry.content)
            .bind(entry.source.as_str())
            .bind(&metadata)
            .bind(vector_literal(&entry.embedding))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Insert failed: {}", e)))?;

        Self::row_to_entry(&row)
    }

    async fn bulk_insert(&self, entries: Vec<NewEntry>) -> Result<usize, DomainError> {
        let count = entries.len();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Transaction failed: {}", e)))?;

        let query = format!(
            "INSERT INTO {} (id, project_id, session_id, content, source, metadata, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6, $7::vector)",
            self.config.table_name
        );

        for entry in entries {
            let metadata = serde_json::Value::Object(entry.metadata.into_iter().collect());

            sqlx::query(&query)
                .bind(Uuid::new_v4())
                .bind(entry.project_id.as_str())
                .bind(entry.session_id.as_ref().map(|s| s.as_str()))
                .bind(&entry.content)
                .bind(entry.source.as_str())
                .bind(&metadata)
                .bind(vector_literal(&entry.embedding))
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::knowledge_base(format!("Bulk insert failed: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Commit failed: {}", e)))?;

        Ok(count)
    }

    async fn update(&self, filter: &EntryFilter, patch: EntryPatch) -> Result<usize, DomainError> {
        if patch.is_empty() {
            return Ok(0);
        }

        let query = format!(
            "UPDATE {} SET \
                content = COALESCE($1, content), \
                metadata = COALESCE($2, metadata), \
                embedding = COALESCE($3::vector, embedding) \
             WHERE project_id = $4 \
               AND ($5::text IS NULL OR session_id = $5) \
               AND ($6::text IS NULL OR source = $6)",
            self.config.table_name
        );

        let metadata = patch
            .metadata
            .map(|m| serde_json::Value::Object(m.into_iter().collect()));

        let result = sqlx::query(&query)
            .bind(patch.content)
            .bind(metadata)
            .bind(patch.embedding.as_deref().map(vector_literal))
            .bind(filter.project_id.as_str())
            .bind(filter.session_id.as_ref().map(|s| s.as_str()))
            .bind(filter.source.map(|s| s.as_str()))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Update failed: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete(&self, filter: &EntryFilter) -> Result<usize, DomainError> {
        let query = format!(
            "DELETE FROM {} \
             WHERE project_id = $1 \
               AND ($2::text IS NULL OR session_id = $2) \
               AND ($3::text IS NULL OR source = $3)",
            self.config.table_name
        );

        let result = sqlx::query(&query)
            .bind(filter.project_id.as_str())
            .bind(filter.session_id.as_ref().map(|s| s.as_str()))
            .bind(filter.source.map(|s| s.as_str()))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Delete failed: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn find_one(&self, filter: &EntryFilter) -> Result<Option<KnowledgeEntry>, DomainError> {
        let query = format!(
            "SELECT {} \
             WHERE project_id = $1 \
               AND ($2::text IS NULL OR session_id = $2) \
               AND ($3::text IS NULL OR source = $3) \
             LIMIT 1",
            self.select_columns()
        );

        let row = sqlx::query(&query)
            .bind(filter.project_id.as_str())
            .bind(filter.session_id.as_ref().map(|s| s.as_str()))
            .bind(filter.source.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Query failed: {}", e)))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn similarity_search(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, DomainError> {
        let query = format!(
            "SELECT {} \
             WHERE project_id = $1 \
               AND ($2::text IS NULL OR session_id = $2) \
               AND 1 - (embedding <=> $3::vector) >= $4 \
             ORDER BY embedding <=> $3::vector \
             LIMIT $5",
            self.select_columns()
        );

        let rows = sqlx::query(&query)
            .bind(project_id.as_str())
            .bind(session_id.map(|s| s.as_str()))
            .bind(vector_literal(embedding))
            .bind(threshold as f64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DomainError::knowledge_base(format!("Similarity search failed: {}", e))
            })?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn list_recent(
        &self,
        project_id: &ProjectId,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, DomainError> {
        let query = format!(
            "SELECT {} \
             WHERE project_id = $1 \
               AND ($2::text IS NULL OR session_id = $2) \
             ORDER BY source ASC, created_at DESC \
             LIMIT $3",
            self.select_columns()
        );

        let rows = sqlx::query(&query)
            .bind(project_id.as_str())
            .bind(session_id.map(|s| s.as_str()))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Query failed: {}", e)))?;

        rows.iter().map(Self::row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[1.0, -0.5, 0.25]), "[1,-0.5,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_parse_vector_round_trip() {
        let original = vec![0.5f32, -1.25, 3.0];
        let parsed = parse_vector(&vector_literal(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_vector_rejects_garbage() {
        assert!(parse_vector("[1,oops,3]").is_err());
        assert_eq!(parse_vector("[]").unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_config_defaults() {
        let config = PgvectorConfig::new(1536);
        assert_eq!(config.table_name, "knowledge_base_entries");
        assert_eq!(config.dimensions, 1536);

        let custom = PgvectorConfig::new(768).with_table_name("custom_entries");
        assert_eq!(custom.table_name, "custom_entries");
    }
}
