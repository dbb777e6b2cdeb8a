//! Markdown parser

use pulldown_cmark::{Event, Parser, Tag};

use super::ContentParser;
use crate::domain::DomainError;

/// Parser for Markdown: renders events to plain text, dropping formatting
/// while keeping block separation.
#[derive(Debug, Clone, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    /// Create a new Markdown parser
    pub fn new() -> Self {
        Self
    }
}

impl ContentParser for MarkdownParser {
    fn parse(&self, raw: &str) -> Result<String, DomainError> {
        let parser = Parser::new(raw);
        let mut text = String::new();

        for event in parser {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                Event::End(Tag::Paragraph)
                | Event::End(Tag::Heading(..))
                | Event::End(Tag::Item)
                | Event::End(Tag::CodeBlock(_)) => {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }

        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        Ok(lines.join("\n"))
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}
