//! HTML parser

use scraper::{Html, Selector};

use super::ContentParser;
use crate::domain::DomainError;

/// Parser for HTML pages: extracts visible body text, skipping script, style
/// and head content, with block elements separated by newlines.
#[derive(Debug, Clone, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    fn extract_text(document: &Html) -> String {
        let body_selector = Selector::parse("body").ok();

        let root = body_selector
            .as_ref()
            .and_then(|sel| document.select(sel).next());

        let text = if let Some(body) = root {
            Self::extract_element_text(&body)
        } else {
            document.root_element().text().collect::<String>()
        };

        Self::normalize_text(&text)
    }

    fn extract_element_text(element: &scraper::ElementRef) -> String {
        let mut text = String::new();

        for node in element.children() {
            if let Some(el) = scraper::ElementRef::wrap(node) {
                let tag_name = el.value().name();

                if matches!(tag_name, "script" | "style" | "noscript" | "head") {
                    continue;
                }

                if matches!(
                    tag_name,
                    "p" | "div"
                        | "h1"
                        | "h2"
                        | "h3"
                        | "h4"
                        | "h5"
                        | "h6"
                        | "br"
                        | "li"
                        | "tr"
                        | "td"
                        | "th"
                ) && !text.is_empty()
                    && !text.ends_with('\n')
                {
                    text.push('\n');
                }

                text.push_str(&Self::extract_element_text(&el));

                if matches!(tag_name, "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
                    text.push('\n');
                }
            } else if let Some(txt) = node.value().as_text() {
                text.push_str(txt);
            }
        }

        text
    }

    fn normalize_text(text: &str) -> String {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        lines.join("\n")
    }
}

impl ContentParser for HtmlParser {
    fn parse(&self, raw: &str) -> Result<String, DomainError> {
        let document = Html::parse_document(raw);
        Ok(Self::extract_text(&document))
    }

    fn name(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_html() {
        let parser = HtmlParser::new();
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head><title>Test Page</title></head>
            <body>
                <h1>Hello World</h1>
                <p>This is a paragraph.</p>
            </body>
            </html>
        "#;

        let content = parser.parse(html).unwrap();

        assert!(content.contains("Hello World"));
        assert!(content.contains("This is a paragraph"));
    }

    #[test]
    fn test_strips_scripts_and_styles() {
        let parser = HtmlParser::new();
        let html = r#"
            <html>
            <body>
                <p>Visible text</p>
                <script>var x = 'hidden';</script>
                <style>.cls { display: none; }</style>
                <p>More visible text</p>
            </body>
            </html>
        "#;

        let content = parser.parse(html).unwrap();

        assert!(content.contains("Visible text"));
        assert!(content.contains("More visible text"));
        assert!(!content.contains("hidden"));
        assert!(!content.contains("display"));
    }

    #[test]
    fn test_nested_elements() {
        let parser = HtmlParser::new();
        let html = "<html><body><div><div><span>Deeply nested</span></div></div></body></html>";

        let content = parser.parse(html).unwrap();
        assert!(content.contains("Deeply nested"));
    }

    #[test]
    fn test_list_items() {
        let parser = HtmlParser::new();
        let html = "<html><body><ul><li>Item 1</li><li>Item 2</li></ul></body></html>";

        let content = parser.parse(html).unwrap();
        assert!(content.contains("Item 1"));
        assert!(content.contains("Item 2"));
    }
}
