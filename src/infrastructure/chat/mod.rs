//! Chat repository implementations

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryChatHistoryRepository, InMemoryChatSessionRepository};
pub use postgres::{PostgresChatHistoryRepository, PostgresChatSessionRepository};
