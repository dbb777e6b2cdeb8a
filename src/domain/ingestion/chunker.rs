//! Chunking configuration and strategy trait

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Configuration for chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target chunk size in characters
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Characters carried over when a chunk is cut mid-sentence
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,
}

fn default_max_chunk_size() -> usize {
    1000
}

fn default_overlap_size() -> usize {
    100
}

impl ChunkerConfig {
    /// Create a new chunking configuration
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size,
            overlap_size,
        }
    }

    /// Validate the configuration.
    ///
    /// An overlap at or above the chunk size would stop forward progress, so
    /// it is rejected rather than clamped.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_chunk_size == 0 {
            return Err(DomainError::validation(
                "max_chunk_size must be greater than 0",
            ));
        }

        if self.overlap_size >= self.max_chunk_size {
            return Err(DomainError::validation(
                "overlap_size must be less than max_chunk_size",
            ));
        }

        Ok(())
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap_size: default_overlap_size(),
        }
    }
}

/// Trait for chunking strategies.
///
/// Implementations are pure: no I/O, and identical inputs always produce
/// identical output.
pub trait ChunkingStrategy: Send + Sync + Debug {
    /// Split content into bounded chunks
    fn chunk(&self, content: &str, config: &ChunkerConfig) -> Result<Vec<String>, DomainError>;

    /// Get the strategy name
    fn name(&self) -> &'static str;
}
