//! Embedding provider implementations

mod openai;

pub use openai::{OpenAiEmbeddingProvider, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL};
