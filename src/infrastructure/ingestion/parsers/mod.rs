//! Content extraction ahead of chunking
//!
//! Uploaded files and scraped pages arrive as plain text, HTML or Markdown;
//! parsers reduce them to embeddable text.

mod html;
mod markdown;
mod plain_text;

pub use html::HtmlParser;
pub use markdown::MarkdownParser;
pub use plain_text::PlainTextParser;

use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::DomainError;

/// Reduces raw input to plain text
pub trait ContentParser: Send + Sync + Debug {
    /// Extract text content from the raw input
    fn parse(&self, raw: &str) -> Result<String, DomainError>;

    /// Get the parser name
    fn name(&self) -> &'static str;
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    #[default]
    PlainText,
    Html,
    Markdown,
}

impl ParserKind {
    /// Pick a parser from a MIME type or file extension hint
    pub fn from_content_type(content_type: &str) -> Self {
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "text/html" | "html" | "htm" => Self::Html,
            "text/markdown" | "markdown" | "md" => Self::Markdown,
            _ => Self::PlainText,
        }
    }
}

/// Factory for content parsers
pub struct ParserFactory;

impl ParserFactory {
    /// Create a parser of the given kind
    pub fn create(kind: ParserKind) -> Arc<dyn ContentParser> {
        match kind {
            ParserKind::PlainText => Arc::new(PlainTextParser::new()),
            ParserKind::Html => Arc::new(HtmlParser::new()),
            ParserKind::Markdown => Arc::new(MarkdownParser::new()),
        }
    }
}
