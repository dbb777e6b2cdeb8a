//! Plain text parser

use super::ContentParser;
use crate::domain::DomainError;

/// Parser for plain text: normalizes line endings and strips trailing
/// whitespace per line.
#[derive(Debug, Clone, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    /// Create a new plain text parser
    pub fn new() -> Self {
        Self
    }
}

impl ContentParser for PlainTextParser {
    fn parse(&self, raw: &str) -> Result<String, DomainError> {
        let lines: Vec<&str> = raw.lines().map(|l| l.trim_end()).collect();
        Ok(lines.join("\n").trim().to_string())
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }
}
