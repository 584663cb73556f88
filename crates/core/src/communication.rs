//! Communication analyzer: pure functions over raw query text.
//!
//! Shared by the orchestrator (tier-specific system prompt, memory
//! summaries) and the post-processor (language enforcement, procedural
//! reformatting, emotional acknowledgment) so both sides agree on what a
//! query looks like without either depending on the other.

use serde::{Deserialize, Serialize};

/// Supported response languages for this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    It,
    En,
    Id,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::It => "it",
            Language::En => "en",
            Language::Id => "id",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deployment default: Italian. Used whenever marker counts fail to clear
/// the override threshold.
pub const DEFAULT_LANGUAGE: Language = Language::It;

const MARKER_OVERRIDE_THRESHOLD: usize = 2;

fn count_markers(lower: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| lower.contains(*m)).count()
}

/// Detects the query's language from marker-word counts. Requires at least
/// `MARKER_OVERRIDE_THRESHOLD` markers for a non-default language to win;
/// mixed or ambiguous content falls back to `DEFAULT_LANGUAGE`.
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();

    let it_markers = count_markers(
        &lower,
        &["ciao", "come", "perche", "perché", "grazie", "sono", "cosa", "quanto costa", "faccio"],
    );
    let en_markers = count_markers(
        &lower,
        &["hello", "the", "what", "how do i", "thanks", "please", "cost", "need"],
    );
    let id_markers = count_markers(
        &lower,
        &["halo", "bagaimana", "berapa", "terima kasih", "saya", "apa", "cara"],
    );

    let mut scores = [(Language::En, en_markers), (Language::Id, id_markers)];
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    if it_markers >= en_markers.max(id_markers) {
        return Language::It;
    }

    let (top_language, top_score) = scores[0];
    if top_score >= MARKER_OVERRIDE_THRESHOLD {
        top_language
    } else {
        DEFAULT_LANGUAGE
    }
}

/// True when the query is asking "how do I ..." in any supported language.
pub fn is_procedural(text: &str) -> bool {
    let lower = text.to_lowercase();
    const TRIGGERS: &[&str] = &[
        "how do i",
        "how to",
        "what are the steps",
        "come faccio a",
        "come posso",
        "quali sono i passaggi",
        "bagaimana cara",
        "langkah-langkah",
    ];
    TRIGGERS.iter().any(|t| lower.contains(t))
}

/// True when the query carries distress, excitement, or frustration
/// keywords in any supported language.
pub fn has_emotional_content(text: &str) -> bool {
    let lower = text.to_lowercase();
    const MARKERS: &[&str] = &[
        // distress / frustration
        "disperato",
        "disperata",
        "preoccupato",
        "preoccupata",
        "frustrato",
        "frustrata",
        "worried",
        "desperate",
        "frustrated",
        "khawatir",
        "putus asa",
        // excitement
        "fantastico",
        "emozionato",
        "excited",
        "amazing",
        "senang sekali",
    ];
    MARKERS.iter().any(|m| lower.contains(m))
}

/// Keyword set used to check whether a draft already contains an
/// empathy acknowledgment for the given language, so the post-processor
/// does not double up on one.
pub fn acknowledgment_keywords(language: Language) -> &'static [&'static str] {
    match language {
        Language::It => &["capisco", "tranquillo", "tranquilla", "aiuto", "soluzione"],
        Language::En => &["understand", "help", "solution", "here for you"],
        Language::Id => &["mengerti", "bantu", "solusi", "tenang"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_italian_by_default() {
        assert_eq!(detect_language("xyz random gibberish 12345"), Language::It);
    }

    #[test]
    fn detects_english_with_enough_markers() {
        assert_eq!(detect_language("hello, what is the cost, please"), Language::En);
    }

    #[test]
    fn detects_indonesian_with_enough_markers() {
        assert_eq!(detect_language("halo, bagaimana cara mengurus visa saya"), Language::Id);
    }

    #[test]
    fn single_marker_does_not_override_default() {
        assert_eq!(detect_language("cost"), Language::It);
    }

    #[test]
    fn procedural_detection_multilingual() {
        assert!(is_procedural("Come faccio a richiedere il KITAS E33G?"));
        assert!(is_procedural("How do I apply for a KITAS?"));
        assert!(is_procedural("Bagaimana cara mengurus visa?"));
        assert!(!is_procedural("What is a KITAS?"));
    }

    #[test]
    fn emotional_content_detection() {
        assert!(has_emotional_content("Ho sbagliato tutto con il mio visto, sono disperato!"));
        assert!(!has_emotional_content("What documents do I need?"));
    }
}
