//! In-memory schema searcher

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::schema::{SchemaHit, SchemaSearcher};
use crate::domain::DomainError;

/// In-memory schema searcher: case-insensitive substring match over titles
/// and bodies, as the schema tables' text search does.
#[derive(Debug)]
pub struct InMemorySchemaSearcher {
    records: Arc<RwLock<Vec<SchemaHit>>>,
}

impl InMemorySchemaSearcher {
    /// Create a new empty searcher
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a record
    pub async fn add(&self, hit: SchemaHit) {
        self.records.write().await.push(hit);
    }
}

impl Default for InMemorySchemaSearcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaSearcher for InMemorySchemaSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SchemaHit>, DomainError> {
        let needle = query.to_lowercase();
        let records = self.records.read().await;

        Ok(records
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.content.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::SchemaRecordType;

    #[tokio::test]
    async fn test_search_matches_title_and_content() {
        let searcher = InMemorySchemaSearcher::new();

        searcher
            .add(SchemaHit::new(
                SchemaRecordType::Blog,
                "Rust Performance Guide",
                "How to make programs fast.",
                "rust-performance-guide",
            ))
            .await;
        searcher
            .add(SchemaHit::new(
                SchemaRecordType::Author,
                "Jamie Doe",
                "Writes about performance tuning.",
                "jamie-doe",
            ))
            .await;
        searcher
            .add(SchemaHit::new(
                SchemaRecordType::Category,
                "Gardening",
                "Plants and soil.",
                "gardening",
            ))
            .await;

        let hits = searcher.search("performance", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = searcher.search("PLANTS", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record_type, SchemaRecordType::Category);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let searcher = InMemorySchemaSearcher::new();

        for i in 0..5 {
            searcher
                .add(SchemaHit::new(
                    SchemaRecordType::Blog,
                    format!("Post {}", i),
                    "shared keyword",
                    format!("post-{}", i),
                ))
                .await;
        }

        let hits = searcher.search("shared", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
    }
}
