//! Prompt assembly: turns a model tier, retrieved documents, conversation
//! memory, and the current turn into the message list a backend sends to
//! the model.

use std::fmt;

use rag_config::{ModelTier, PromptTemplates};
use rag_core::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: content.into() }
    }
}

/// Builds the message list handed to a model backend for one turn.
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    /// Push the tier-specific system prompt (persona, compliance,
    /// guidelines, and the tier's objective/instructions).
    pub fn system_prompt(mut self, tier: ModelTier, templates: &PromptTemplates) -> Self {
        self.messages.push(Message::system(templates.build_system_prompt(tier)));
        self
    }

    /// Push a summary of facts already known about the user, extracted
    /// from earlier turns by the orchestrator's memory module.
    pub fn with_memory(mut self, known_facts: &str) -> Self {
        if !known_facts.is_empty() {
            self.messages.push(Message::system(format!(
                "## Known facts about this user\n{known_facts}"
            )));
        }
        self
    }

    /// Push retrieved documents as numbered, citable context.
    pub fn with_context(mut self, documents: &[Document]) -> Self {
        if documents.is_empty() {
            return self;
        }

        let context = documents
            .iter()
            .enumerate()
            .map(|(i, d)| format!("[{}] (source: {})\n{}", i + 1, d.source_collection, d.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        self.messages.push(Message::system(format!(
            "## Retrieved context\n{context}\n\nCite sources by their [n] bracket number when used."
        )));
        self
    }

    pub fn with_history(mut self, history: &[Message]) -> Self {
        self.messages.extend(history.iter().cloned());
        self
    }

    pub fn user_message(mut self, message: &str) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    pub fn build(self) -> Vec<Message> {
        self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn estimate_tokens(&self) -> usize {
        self.messages.iter().map(|m| m.content.len() / 4).sum()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn builder_orders_system_before_user() {
        let templates = PromptTemplates::default();
        let messages = PromptBuilder::new()
            .system_prompt(ModelTier::Pro, &templates)
            .user_message("What documents do I need for a KITAS?")
            .build();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn with_context_numbers_sources() {
        let templates = PromptTemplates::default();
        let docs = vec![
            Document::new("1", "KITAS requires a sponsor letter", 0.9, "visa_kb"),
            Document::new("2", "NPWP takes five business days", 0.8, "tax_kb"),
        ];

        let messages = PromptBuilder::new()
            .system_prompt(ModelTier::Pro, &templates)
            .with_context(&docs)
            .user_message("How long does a KITAS take?")
            .build();

        assert!(messages[1].content.contains("[1]"));
        assert!(messages[1].content.contains("[2]"));
    }

    #[test]
    fn empty_context_adds_no_message() {
        let templates = PromptTemplates::default();
        let messages = PromptBuilder::new()
            .system_prompt(ModelTier::Fast, &templates)
            .with_context(&[])
            .user_message("Ciao")
            .build();

        assert_eq!(messages.len(), 2);
    }
}
