//! Public retrieval trait — the knowledge-search entry point.
//!
//! `rag::SearchService` implements this directly. Because the query router
//! is pure and has no module-level state, both this trait's callers and the
//! Search Service's own internal callers get equivalent routing decisions
//! for the same query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

#[async_trait]
pub trait Retriever: Send + Sync + 'static {
    /// Retrieve relevant documents for a query.
    ///
    /// Returns documents sorted by relevance (highest first).
    async fn retrieve(&self, query: &str, options: &RetrieveOptions) -> Result<Vec<Document>>;

    /// Retriever name, for logging and metrics labels.
    fn name(&self) -> &str;
}

/// Retrieval options accepted by the knowledge-search entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveOptions {
    pub top_k: usize,
    pub user_level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_override: Option<String>,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            user_level: 0,
            tier_filter: None,
            collection_override: None,
        }
    }
}

impl RetrieveOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_user_level(mut self, user_level: u8) -> Self {
        self.user_level = user_level;
        self
    }

    pub fn with_collection_override(mut self, collection: impl Into<String>) -> Self {
        self.collection_override = Some(collection.into());
        self
    }
}

/// A single retrieved document, in the stable public schema exposed to
/// callers (explicit defaults, no breaking field removals across versions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, serde_json::Value>,
    pub source_collection: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>, score: f32, source_collection: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score,
            metadata: std::collections::HashMap::new(),
            source_collection: source_collection.into(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Conversation context handed to the agentic orchestrator's tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    pub recent_turns: Vec<ConversationTurn>,
    pub entities: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

impl ConversationContext {
    pub fn add_turn(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.recent_turns.push(ConversationTurn {
            role: role.into(),
            content: content.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieve_options_builder() {
        let options = RetrieveOptions::default()
            .with_top_k(10)
            .with_user_level(2)
            .with_collection_override("pricing");

        assert_eq!(options.top_k, 10);
        assert_eq!(options.user_level, 2);
        assert_eq!(options.collection_override.as_deref(), Some("pricing"));
    }

    #[test]
    fn document_builder() {
        let doc = Document::new("doc-1", "KITAS requirements", 0.95, "visa_kb")
            .with_metadata("regulation_number", "12/2023");

        assert_eq!(doc.id, "doc-1");
        assert!(doc.metadata.contains_key("regulation_number"));
    }
}
