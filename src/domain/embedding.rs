//! Embedding provider trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::error::DomainError;

/// Maps text to a fixed-length vector. Used by both the ingestion and query
/// paths; an entry's stored embedding is always this provider's output over
/// exactly the entry's content.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Embed a batch of texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Vector length produced by this provider
    fn dimensions(&self) -> usize;

    /// Provider name for diagnostics
    fn provider_name(&self) -> &'static str;
}
