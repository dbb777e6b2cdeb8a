//! Domain layer: entities, collaborator traits and the error taxonomy.
//!
//! Nothing in this module performs I/O; persistence and network access live
//! behind the traits defined here and are implemented under
//! `crate::infrastructure`.

pub mod chat;
pub mod completion;
pub mod content;
pub mod context;
pub mod embedding;
pub mod error;
pub mod ids;
pub mod ingestion;
pub mod knowledge;
pub mod schema;

pub use chat::{ChatHistoryRepository, ChatMessage, ChatRole, ChatSession, ChatSessionRepository};
pub use completion::{CompletionProvider, CompletionStream, PromptMessage};
pub use content::{ContentVersion, ContentVersionRepository, NewContentVersion};
pub use context::RagContext;
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use ids::{ProjectId, SessionId};
pub use ingestion::{ChunkerConfig, ChunkingStrategy};
pub use knowledge::{KnowledgeEntry, KnowledgeSource, KnowledgeStore};
pub use schema::{SchemaHit, SchemaSearcher};
