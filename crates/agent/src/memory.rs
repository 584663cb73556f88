//! Conversation memory: hierarchical working/episodic/semantic store.
//!
//! Built fresh per request from the caller-supplied turn history (the
//! orchestrator holds no state across requests — see the concurrency
//! model's "no module-level mutable state" rule). Error-stub turns are
//! dropped, the remainder truncated to the most recent `working_memory_size`
//! turns, anything older is folded into one episodic summary, and a simple
//! slot-filling pass over the kept user turns seeds "known facts about the
//! user" for the system prompt.

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use rag_config::MemoryConfig;
use rag_core::{Turn, TurnRole};

/// A folded-together summary of turns evicted from working memory.
#[derive(Debug, Clone)]
pub struct EpisodicSummary {
    pub summary: String,
    pub turns_count: usize,
}

/// A fact extracted from an earlier user turn.
#[derive(Debug, Clone)]
pub struct SemanticFact {
    pub key: String,
    pub value: String,
    pub confidence: f32,
}

pub struct ConversationMemory {
    config: MemoryConfig,
    working: RwLock<Vec<Turn>>,
    episodic: RwLock<VecDeque<EpisodicSummary>>,
    semantic: RwLock<HashMap<String, SemanticFact>>,
}

impl ConversationMemory {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            working: RwLock::new(Vec::new()),
            episodic: RwLock::new(VecDeque::new()),
            semantic: RwLock::new(HashMap::new()),
        }
    }

    /// Builds memory for one turn from the caller-supplied history.
    pub fn from_history(history: &[Turn], config: MemoryConfig) -> Self {
        let memory = Self::new(config);

        let clean: Vec<&Turn> = history.iter().filter(|t| !t.is_error_stub()).collect();
        let keep_from = clean.len().saturating_sub(memory.config.working_memory_size);
        let (older, recent) = clean.split_at(keep_from);

        if !older.is_empty() {
            memory.summarize_into_episodic(older);
        }

        for turn in recent {
            memory.working.write().push((*turn).clone());
            if memory.config.semantic_memory_enabled && turn.role == TurnRole::User {
                for (key, value) in extract_facts(&turn.content) {
                    memory.add_fact(&key, &value, 0.7);
                }
            }
        }

        memory
    }

    fn summarize_into_episodic(&self, turns: &[&Turn]) {
        let summary = turns
            .iter()
            .filter(|t| t.role == TurnRole::User)
            .map(|t| t.content.chars().take(50).collect::<String>())
            .collect::<Vec<_>>()
            .join("; ");

        let mut episodic = self.episodic.write();
        episodic.push_back(EpisodicSummary { summary: format!("User previously discussed: {summary}"), turns_count: turns.len() });
        if episodic.len() > self.config.max_episodic_summaries {
            episodic.pop_front();
        }
    }

    pub fn add_fact(&self, key: &str, value: &str, confidence: f32) {
        if !self.config.semantic_memory_enabled {
            return;
        }
        self.semantic.write().insert(key.to_string(), SemanticFact { key: key.to_string(), value: value.to_string(), confidence });
    }

    pub fn get_fact(&self, key: &str) -> Option<SemanticFact> {
        self.semantic.read().get(key).cloned()
    }

    pub fn recent_turns(&self) -> Vec<Turn> {
        self.working.read().clone()
    }

    pub fn episodic_summaries(&self) -> Vec<EpisodicSummary> {
        self.episodic.read().iter().cloned().collect()
    }

    /// Renders known facts plus episodic summaries as the text block
    /// `PromptBuilder::with_memory` injects into the system prompt.
    pub fn known_facts_summary(&self) -> String {
        let mut text = String::new();

        let facts = self.semantic.read();
        if !facts.is_empty() {
            let mut entries: Vec<&SemanticFact> = facts.values().collect();
            entries.sort_by(|a, b| a.key.cmp(&b.key));
            for fact in entries {
                text.push_str(&format!("- {}: {}\n", fact.key, fact.value));
            }
        }

        let episodic = self.episodic.read();
        for summary in episodic.iter() {
            text.push_str(&format!("- {}\n", summary.summary));
        }

        text
    }
}

/// Anchored phrase → fact key, one per supported language. The match takes
/// the words following the anchor, up to the next sentence boundary.
const FACT_ANCHORS: &[(&str, &str)] = &[
    ("mi chiamo ", "name"),
    ("il mio nome è ", "name"),
    ("my name is ", "name"),
    ("nama saya ", "name"),
    ("vivo a ", "city"),
    ("abito a ", "city"),
    ("i live in ", "city"),
    ("saya tinggal di ", "city"),
    ("lavoro come ", "profession"),
    ("i work as ", "profession"),
    ("il mio budget è ", "budget"),
    ("my budget is ", "budget"),
    ("budget di ", "budget"),
];

fn extract_facts(text: &str) -> Vec<(String, String)> {
    let lower = text.to_lowercase();
    let mut facts = Vec::new();

    for (anchor, key) in FACT_ANCHORS {
        if let Some(start) = lower.find(anchor) {
            let after = &text[start + anchor.len()..];
            let end = after.find(['.', ',', '\n', '!', '?']).unwrap_or(after.len());
            let value = after[..end].trim();
            if !value.is_empty() {
                facts.push((key.to_string(), value.to_string()));
            }
        }
    }

    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_error_stub_turns() {
        let history = vec![
            Turn::user("hello"),
            Turn::assistant("service unavailable").with_metadata(rag_core::TurnMetadata::error()),
            Turn::assistant("here you go"),
        ];

        let memory = ConversationMemory::from_history(&history, MemoryConfig::default());
        assert_eq!(memory.recent_turns().len(), 2);
        assert!(memory.recent_turns().iter().all(|t| !t.is_error_stub()));
    }

    #[test]
    fn extracts_name_from_italian_phrase() {
        let history = vec![Turn::user("Ciao, mi chiamo Giulia, ho bisogno di un KITAS")];
        let memory = ConversationMemory::from_history(&history, MemoryConfig::default());
        assert_eq!(memory.get_fact("name").unwrap().value, "Giulia");
    }

    #[test]
    fn truncates_to_working_memory_size_and_summarizes_the_rest() {
        let mut config = MemoryConfig::default();
        config.working_memory_size = 2;

        let history: Vec<Turn> = (0..5).map(|i| Turn::user(format!("message {i}"))).collect();
        let memory = ConversationMemory::from_history(&history, config);

        assert_eq!(memory.recent_turns().len(), 2);
        assert_eq!(memory.episodic_summaries().len(), 1);
    }

    #[test]
    fn known_facts_summary_includes_extracted_fact() {
        let history = vec![Turn::user("My name is Marco and I live in Bali")];
        let memory = ConversationMemory::from_history(&history, MemoryConfig::default());
        let summary = memory.known_facts_summary();
        assert!(summary.contains("Marco"));
    }
}
