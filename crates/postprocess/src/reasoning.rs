//! Strips leaked chain-of-thought paragraphs from a draft answer before it
//! ever reaches the customer.

use regex::Regex;
use std::sync::OnceLock;

fn leaked_paragraph_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)^\s*okay,?\s+since\b",
            r"(?i)^\s*given that\b.*observation:",
            r"(?i)^\s*(thought|observation)\s*:",
            r"(?i)^\s*let me think\b",
            r"(?i)^\s*in the grand scheme\b",
            r"(?i)^\s*ultimately,?\s+it makes one wonder\b",
            r"(?i)^\s*philosophically speaking\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern is valid"))
        .collect()
    })
}

/// Removes paragraphs that match known leaked-reasoning or
/// unrelated-philosophical-coda patterns, leaving only the substantive
/// answer paragraphs.
pub fn strip_internal_reasoning(draft: &str) -> String {
    let patterns = leaked_paragraph_patterns();

    let kept: Vec<&str> = draft
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .filter(|paragraph| !patterns.iter().any(|p| p.is_match(paragraph)))
        .collect();

    kept.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leaked_thought_paragraph() {
        let draft = "Okay, since the user asked about KITAS, let's reason step by step.\n\nKITAS requires a sponsor letter.";
        let cleaned = strip_internal_reasoning(draft);
        assert_eq!(cleaned, "KITAS requires a sponsor letter.");
    }

    #[test]
    fn strips_standalone_observation_marker() {
        let draft = "Observation: the tool returned three documents.\n\nHere is your answer.";
        let cleaned = strip_internal_reasoning(draft);
        assert_eq!(cleaned, "Here is your answer.");
    }

    #[test]
    fn strips_trailing_philosophical_coda() {
        let draft = "Your visa is ready in five days.\n\nUltimately, it makes one wonder about the nature of bureaucracy.";
        let cleaned = strip_internal_reasoning(draft);
        assert_eq!(cleaned, "Your visa is ready in five days.");
    }

    #[test]
    fn leaves_clean_draft_untouched() {
        let draft = "Your KITAS application needs a sponsor letter and a passport copy.";
        assert_eq!(strip_internal_reasoning(draft), draft);
    }
}
