//! Structured schema search seam
//!
//! The schema tables (pages, authors, categories) live in the surrounding
//! CRUD layer; the core only needs a search view of them for context
//! assembly.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Which schema table a hit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaRecordType {
    Blog,
    Author,
    Category,
}

impl std::fmt::Display for SchemaRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blog => write!(f, "blog"),
            Self::Author => write!(f, "author"),
            Self::Category => write!(f, "category"),
        }
    }
}

/// A structured schema search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaHit {
    pub record_type: SchemaRecordType,
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl SchemaHit {
    pub fn new(
        record_type: SchemaRecordType,
        title: impl Into<String>,
        content: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            slug: slug.into(),
            created_at: Utc::now(),
        }
    }
}

/// Text search over the schema tables
#[async_trait]
pub trait SchemaSearcher: Send + Sync + Debug {
    /// Case-insensitive substring search across titles and bodies
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SchemaHit>, DomainError>;
}
