//! Prepends an empathy sentence to answers for emotionally charged queries
//! that don't already carry one.

use rag_core::{acknowledgment_keywords, Language};

fn acknowledgment_sentence(language: Language) -> &'static str {
    match language {
        Language::It => "Capisco che questa situazione possa preoccuparti, ma sono qui per aiutarti a trovare una soluzione.",
        Language::En => "I understand this can be stressful, and I'm here to help you find a solution.",
        Language::Id => "Saya mengerti ini bisa membuat khawatir, dan saya di sini untuk membantu mencari solusi.",
    }
}

fn already_acknowledges(draft: &str, language: Language) -> bool {
    let lower = draft.to_lowercase();
    acknowledgment_keywords(language).iter().any(|kw| lower.contains(kw))
}

/// If the query carries emotional content and the draft lacks any
/// acknowledgment keyword for the given language, prepends one short
/// empathy sentence.
pub fn inject_emotional_acknowledgment(draft: &str, language: Language, has_emotional_content: bool) -> String {
    if !has_emotional_content || already_acknowledges(draft, language) {
        return draft.to_string();
    }

    format!("{}\n\n{}", acknowledgment_sentence(language), draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_acknowledgment_when_missing() {
        let draft = "Ecco i documenti necessari per il tuo visto.";
        let result = inject_emotional_acknowledgment(draft, Language::It, true);
        assert!(result.contains("Capisco"));
        assert!(result.ends_with(draft));
    }

    #[test]
    fn skips_when_draft_already_acknowledges() {
        let draft = "Capisco la tua preoccupazione. Ecco i documenti necessari.";
        let result = inject_emotional_acknowledgment(draft, Language::It, true);
        assert_eq!(result, draft);
    }

    #[test]
    fn skips_when_no_emotional_content() {
        let draft = "Ecco i documenti necessari.";
        assert_eq!(inject_emotional_acknowledgment(draft, Language::It, false), draft);
    }
}
