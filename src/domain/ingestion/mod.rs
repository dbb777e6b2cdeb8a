//! Ingestion domain: chunking configuration and strategy trait

mod chunker;

pub use chunker::{ChunkerConfig, ChunkingStrategy};
