//! Bounded context object handed to the prompt layer

use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMessage;
use crate::domain::knowledge::{KnowledgeEntry, KnowledgeSource};
use crate::domain::schema::SchemaHit;

/// Assembled retrieval context: recent chat history, relevant knowledge and
/// optional structured schema data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagContext {
    /// Last messages of the session, ascending by time
    pub chat_history: Vec<ChatMessage>,
    /// Retrieved knowledge entries, best matches first
    pub relevant_knowledge: Vec<KnowledgeEntry>,
    /// Structured schema search results, when a searcher is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_data: Option<Vec<SchemaHit>>,
}

impl RagContext {
    pub fn new(chat_history: Vec<ChatMessage>, relevant_knowledge: Vec<KnowledgeEntry>) -> Self {
        Self {
            chat_history,
            relevant_knowledge,
            schema_data: None,
        }
    }

    /// Attach schema search results
    pub fn with_schema_data(mut self, schema_data: Vec<SchemaHit>) -> Self {
        self.schema_data = Some(schema_data);
        self
    }

    /// True when neither history nor knowledge is available
    pub fn is_empty(&self) -> bool {
        self.chat_history.is_empty() && self.relevant_knowledge.is_empty()
    }

    /// Number of knowledge entries from a given source
    pub fn knowledge_count_by_source(&self, source: KnowledgeSource) -> usize {
        self.relevant_knowledge
            .iter()
            .filter(|e| e.source == source)
            .count()
    }
}
