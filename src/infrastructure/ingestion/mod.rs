//! Ingestion infrastructure: chunkers and parsers

pub mod chunkers;
pub mod parsers;

pub use chunkers::{ChunkerFactory, ChunkerKind, FixedSizeChunker, SentenceOverlapChunker};
pub use parsers::{ContentParser, HtmlParser, MarkdownParser, ParserFactory, ParserKind, PlainTextParser};
