//! Knowledge store implementations

mod in_memory;
mod pgvector;

pub use in_memory::InMemoryKnowledgeStore;
pub use pgvector::{PgvectorConfig, PgvectorKnowledgeStore};
