//! Text completion provider trait definition

use std::fmt::Debug;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Role of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// A message handed to the completion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// An incremental piece of a streamed completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionChunk {
    /// Text delta, when the chunk carries one
    pub delta: Option<String>,
    /// Whether the stream has terminated
    pub finished: bool,
}

impl CompletionChunk {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: Some(text.into()),
            finished: false,
        }
    }

    pub fn finished() -> Self {
        Self {
            delta: None,
            finished: true,
        }
    }
}

/// Stream type for incremental completions
pub type CompletionStream =
    Pin<Box<dyn Stream<Item = Result<CompletionChunk, DomainError>> + Send>>;

/// Opaque text-completion service the core generates with
#[async_trait]
pub trait CompletionProvider: Send + Sync + Debug {
    /// Produce the assistant's reply to the given messages
    async fn complete(&self, messages: Vec<PromptMessage>) -> Result<String, DomainError>;

    /// Produce the reply as an incremental token stream, terminated by a
    /// finished chunk
    async fn complete_stream(
        &self,
        messages: Vec<PromptMessage>,
    ) -> Result<CompletionStream, DomainError>;

    /// Provider name for diagnostics
    fn provider_name(&self) -> &'static str;
}
