//! Knowledge base entry and related types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ids::{ProjectId, SessionId};

/// Origin of a knowledge base entry.
///
/// The string form doubles as the storage tag and the sort key for the
/// direct-fetch fallback ordering, where `published_content` sorts ahead of
/// `user_upload` and `web_scraping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSource {
    /// Content published from a content version
    PublishedContent,
    /// Structured page schema content
    SchemaPages,
    /// Structured component schema content
    SchemaComponents,
    /// Global SEO schema content
    SchemaGlobalSeo,
    /// Assistant-generated drafts
    GeneratedContent,
    /// Documents uploaded by the user
    UserUpload,
    /// Pages captured by the scraper
    WebScraping,
}

impl KnowledgeSource {
    /// All known sources
    pub const ALL: &'static [KnowledgeSource] = &[
        Self::PublishedContent,
        Self::SchemaPages,
        Self::SchemaComponents,
        Self::SchemaGlobalSeo,
        Self::GeneratedContent,
        Self::UserUpload,
        Self::WebScraping,
    ];

    /// The snake_case storage tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishedContent => "published_content",
            Self::SchemaPages => "schema_pages",
            Self::SchemaComponents => "schema_components",
            Self::SchemaGlobalSeo => "schema_global_seo",
            Self::GeneratedContent => "generated_content",
            Self::UserUpload => "user_upload",
            Self::WebScraping => "web_scraping",
        }
    }

    /// Parse a storage tag back into a source
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == tag)
    }
}

impl std::fmt::Display for KnowledgeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialOrd for KnowledgeSource {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KnowledgeSource {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/// A stored knowledge base entry with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Owning project
    pub project_id: ProjectId,
    /// Owning session; `None` means the entry is project-wide
    pub session_id: Option<SessionId>,
    /// Content text
    pub content: String,
    /// Origin of the entry
    pub source: KnowledgeSource,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Embedding vector over exactly `content`
    pub embedding: Vec<f32>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Entry data for insertion (id and timestamp assigned by the store)
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub project_id: ProjectId,
    pub session_id: Option<SessionId>,
    pub content: String,
    pub source: KnowledgeSource,
    pub metadata: HashMap<String, serde_json::Value>,
    pub embedding: Vec<f32>,
}

impl NewEntry {
    /// Create a new project-wide entry
    pub fn new(
        project_id: ProjectId,
        content: impl Into<String>,
        source: KnowledgeSource,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            project_id,
            session_id: None,
            content: content.into(),
            source,
            metadata: HashMap::new(),
            embedding,
        }
    }

    /// Scope the entry to a session
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Add a metadata key
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set all metadata
    pub fn with_all_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Fields to change on entries matched by an [`EntryFilter`]
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub content: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub embedding: Option<Vec<f32>>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.metadata.is_none() && self.embedding.is_none()
    }
}

/// Typed matcher for update/delete operations
#[derive(Debug, Clone)]
pub struct EntryFilter {
    pub project_id: ProjectId,
    /// `Some` restricts to that session; `None` matches any scope
    pub session_id: Option<SessionId>,
    /// `Some` restricts to that source
    pub source: Option<KnowledgeSource>,
}

impl EntryFilter {
    /// Match every entry of a project
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            session_id: None,
            source: None,
        }
    }

    /// Restrict to a session
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Restrict to a source
    pub fn with_source(mut self, source: KnowledgeSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether an entry matches this filter
    pub fn matches(&self, entry: &KnowledgeEntry) -> bool {
        if entry.project_id != self.project_id {
            return false;
        }

        if let Some(ref session) = self.session_id {
            if entry.session_id.as_ref() != Some(session) {
                return false;
            }
        }

        if let Some(source) = self.source {
            if entry.source != source {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(project: &str, session: Option<&str>, source: KnowledgeSource) -> KnowledgeEntry {
        KnowledgeEntry {
            id: Uuid::new_v4(),
            project_id: ProjectId::new(project).unwrap(),
            session_id: session.map(|s| SessionId::new(s).unwrap()),
            content: "content".to_string(),
            source,
            metadata: HashMap::new(),
            embedding: vec![0.0; 4],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_source_tags_round_trip() {
        for source in KnowledgeSource::ALL {
            assert_eq!(KnowledgeSource::parse(source.as_str()), Some(*source));
        }
        assert_eq!(KnowledgeSource::parse("unknown"), None);
    }

    #[test]
    fn test_source_ordering_favors_published_content() {
        let mut sources = vec![
            KnowledgeSource::WebScraping,
            KnowledgeSource::UserUpload,
            KnowledgeSource::PublishedContent,
        ];
        sources.sort();

        assert_eq!(sources[0], KnowledgeSource::PublishedContent);
        assert_eq!(sources[2], KnowledgeSource::WebScraping);
    }

    #[test]
    fn test_filter_project_scope() {
        let filter = EntryFilter::for_project(ProjectId::new("p1").unwrap());

        assert!(filter.matches(&entry("p1", None, KnowledgeSource::UserUpload)));
        assert!(filter.matches(&entry("p1", Some("s1"), KnowledgeSource::WebScraping)));
        assert!(!filter.matches(&entry("p2", None, KnowledgeSource::UserUpload)));
    }

    #[test]
    fn test_filter_session_and_source() {
        let filter = EntryFilter::for_project(ProjectId::new("p1").unwrap())
            .with_session(SessionId::new("s1").unwrap())
            .with_source(KnowledgeSource::PublishedContent);

        assert!(filter.matches(&entry("p1", Some("s1"), KnowledgeSource::PublishedContent)));
        assert!(!filter.matches(&entry("p1", Some("s2"), KnowledgeSource::PublishedContent)));
        assert!(!filter.matches(&entry("p1", Some("s1"), KnowledgeSource::UserUpload)));
        assert!(!filter.matches(&entry("p1", None, KnowledgeSource::PublishedContent)));
    }

    #[test]
    fn test_entry_patch_is_empty() {
        assert!(EntryPatch::new().is_empty());
        assert!(!EntryPatch::new().with_content("updated").is_empty());
    }
}
