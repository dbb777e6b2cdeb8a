//! Sentence-boundary chunking with overlap fallback

use crate::domain::ingestion::{ChunkerConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Chunking strategy that prefers clean sentence boundaries.
///
/// The text is scanned in windows of `max_chunk_size` characters. Within each
/// window the last sentence terminator (`.`, `!`, `?`) is located; if it sits
/// past 70% of the window the cut lands there and the next window starts just
/// after it. Otherwise the cut falls on the raw window boundary and the next
/// window starts `overlap_size` characters back, so context survives an
/// arbitrary cut.
#[derive(Debug, Clone, Default)]
pub struct SentenceOverlapChunker;

impl SentenceOverlapChunker {
    /// Create a new sentence-overlap chunker
    pub fn new() -> Self {
        Self
    }

    fn is_terminator(c: char) -> bool {
        matches!(c, '.' | '!' | '?')
    }
}

impl ChunkingStrategy for SentenceOverlapChunker {
    fn chunk(&self, content: &str, config: &ChunkerConfig) -> Result<Vec<String>, DomainError> {
        config.validate()?;

        let chars: Vec<char> = content.chars().collect();

        if chars.len() <= config.max_chunk_size {
            return Ok(vec![content.to_string()]);
        }

        let boundary_floor = config.max_chunk_size as f64 * 0.7;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = usize::min(start + config.max_chunk_size, chars.len());
            let window = &chars[start..end];

            if end < chars.len() {
                let last_terminator = window.iter().rposition(|&c| Self::is_terminator(c));

                match last_terminator {
                    Some(pos) if pos as f64 > boundary_floor => {
                        let chunk: String = window[..=pos].iter().collect();
                        chunks.push(chunk.trim().to_string());
                        start += pos + 1;
                    }
                    _ => {
                        let chunk: String = window.iter().collect();
                        chunks.push(chunk.trim().to_string());
                        // overlap_size < max_chunk_size, so start always advances
                        start = end - config.overlap_size;
                    }
                }
            } else {
                let chunk: String = window.iter().collect();
                chunks.push(chunk.trim().to_string());
                break;
            }
        }

        chunks.retain(|c| !c.is_empty());

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "sentence_overlap"
    }
}
