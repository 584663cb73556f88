//! Enforces numbered-step formatting on procedural answers.

use regex::Regex;
use std::sync::OnceLock;

fn numbered_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^[1-9][.)]").expect("static pattern is valid"))
}

/// Number of lines in `draft` that already start with a `1.`/`1)`-style
/// ordinal marker.
fn numbered_line_count(draft: &str) -> usize {
    numbered_line_pattern().find_iter(draft).count()
}

/// Splits a draft into sentence-sized steps, skipping fragments too short
/// to be a real instruction.
fn split_into_steps(draft: &str) -> Vec<String> {
    draft
        .replace('\n', " ")
        .split(['.', ';'])
        .map(str::trim)
        .filter(|s| s.split_whitespace().count() >= 3)
        .map(|s| s.to_string())
        .collect()
}

/// If the query is procedural and the draft doesn't already read as a
/// numbered list, reformats it into one. Leaves drafts that already carry
/// ≥2 numbered lines untouched.
pub fn enforce_procedural_formatting(draft: &str, is_procedural: bool) -> String {
    if !is_procedural || numbered_line_count(draft) >= 2 {
        return draft.to_string();
    }

    let steps = split_into_steps(draft);
    if steps.len() < 2 {
        return draft.to_string();
    }

    steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_already_numbered_draft_untouched() {
        let draft = "1. Gather your passport.\n2. Submit the sponsor letter.";
        assert_eq!(enforce_procedural_formatting(draft, true), draft);
    }

    #[test]
    fn reformats_prose_into_numbered_steps() {
        let draft = "First gather your passport copy. Then submit the sponsor letter. Finally wait for approval.";
        let formatted = enforce_procedural_formatting(draft, true);
        assert!(formatted.starts_with("1."));
        assert!(formatted.contains("2."));
        assert!(formatted.contains("3."));
    }

    #[test]
    fn non_procedural_draft_is_untouched() {
        let draft = "A KITAS is a limited stay permit.";
        assert_eq!(enforce_procedural_formatting(draft, false), draft);
    }
}
