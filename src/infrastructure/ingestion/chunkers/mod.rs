//! Chunking strategy implementations

mod fixed_size;
mod sentence_overlap;

pub use fixed_size::FixedSizeChunker;
pub use sentence_overlap::SentenceOverlapChunker;

use std::sync::Arc;

use crate::domain::ingestion::ChunkingStrategy;

/// Available chunking strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkerKind {
    /// Sentence-boundary cuts with overlap fallback
    #[default]
    SentenceOverlap,
    /// Plain fixed-size slices
    FixedSize,
}

/// Factory for chunking strategies
pub struct ChunkerFactory;

impl ChunkerFactory {
    /// Create a chunker of the given kind
    pub fn create(kind: ChunkerKind) -> Arc<dyn ChunkingStrategy> {
        match kind {
            ChunkerKind::SentenceOverlap => Arc::new(SentenceOverlapChunker::new()),
            ChunkerKind::FixedSize => Arc::new(FixedSizeChunker::new()),
        }
    }
}
