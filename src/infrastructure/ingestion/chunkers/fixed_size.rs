//! Fixed-size chunking strategy

use crate::domain::ingestion::{ChunkerConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Chunking strategy that cuts plain `max_chunk_size` slices with no overlap.
///
/// Used for raw file uploads where sentence structure is unknown or
/// irrelevant.
#[derive(Debug, Clone, Default)]
pub struct FixedSizeChunker;

impl FixedSizeChunker {
    /// Create a new fixed-size chunker
    pub fn new() -> Self {
        Self
    }
}

impl ChunkingStrategy for FixedSizeChunker {
    fn chunk(&self, content: &str, config: &ChunkerConfig) -> Result<Vec<String>, DomainError> {
        config.validate()?;

        let chars: Vec<char> = content.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = usize::min(start + config.max_chunk_size, chars.len());
            let chunk: String = chars[start..end].iter().collect();

            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }

            start = end;
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "fixed_size"
    }
}
