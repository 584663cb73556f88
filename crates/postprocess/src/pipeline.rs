//! Runs the six post-processing transforms, in order, on a finalized draft.

use std::sync::Arc;

use rag_core::{detect_language, has_emotional_content, is_procedural};
use rag_llm::LlmBackend;

use crate::citations::{attach_citation_footer, collect_sources};
use crate::formatting::enforce_procedural_formatting;
use crate::language::enforce_language;
use crate::reasoning::strip_internal_reasoning;
use crate::emotion::inject_emotional_acknowledgment;
use crate::types::{ProcessedAnswer, ToolTraceEntry, VerificationTier};
use crate::verification::compute_verification_score;

const LOW_CONFIDENCE_THRESHOLD: u8 = 50;

fn low_confidence_banner(language: rag_core::Language) -> &'static str {
    match language {
        rag_core::Language::It => "Nota: questa risposta ha una confidenza bassa. Verifica le informazioni con il nostro team.",
        rag_core::Language::En => "Note: this answer has low confidence. Please verify with our team.",
        rag_core::Language::Id => "Catatan: jawaban ini memiliki kepercayaan rendah. Mohon verifikasi dengan tim kami.",
    }
}

/// Turns a raw model draft into the finalized, customer-facing answer.
pub struct PostProcessor {
    retranslator: Option<Arc<dyn LlmBackend>>,
}

impl PostProcessor {
    pub fn new(retranslator: Option<Arc<dyn LlmBackend>>) -> Self {
        Self { retranslator }
    }

    /// Applies strip-reasoning, language enforcement, procedural
    /// formatting, emotional acknowledgment, citation attachment, and
    /// verification scoring, in that order.
    pub async fn process(&self, draft: &str, query: &str, tool_trace: &[ToolTraceEntry]) -> ProcessedAnswer {
        let query_language = detect_language(query);

        let draft = strip_internal_reasoning(draft);
        let draft = enforce_language(&draft, query_language, self.retranslator.as_ref()).await;
        let draft = enforce_procedural_formatting(&draft, is_procedural(query));
        let draft = inject_emotional_acknowledgment(&draft, query_language, has_emotional_content(query));

        let sources = collect_sources(tool_trace);
        let (score, tier) = compute_verification_score(&sources, tool_trace);

        if score < LOW_CONFIDENCE_THRESHOLD {
            let text = format!("{}\n\n{}", low_confidence_banner(query_language), draft);
            return ProcessedAnswer { text, sources: Vec::new(), verification_score: score, verification_tier: tier };
        }

        let text = attach_citation_footer(&draft, &sources);
        ProcessedAnswer { text, sources, verification_score: score, verification_tier: tier }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn small_talk_has_no_sources_and_no_banner() {
        let processor = PostProcessor::new(None);
        let answer = processor.process("Ciao! Sto bene, grazie.", "Ciao, come stai?", &[]).await;
        assert_eq!(answer.verification_tier, VerificationTier::High);
        assert!(answer.sources.is_empty());
        assert!(!answer.text.contains("bassa"));
    }

    #[tokio::test]
    async fn low_confidence_suppresses_citations_and_adds_banner() {
        let trace = vec![ToolTraceEntry::new(
            "vector_search",
            json!({}),
            json!({ "results": [{ "text": "weak match", "metadata": {}, "score": 0.1 }] }),
            true,
            10,
        )];
        let processor = PostProcessor::new(None);
        let answer = processor.process("Some draft answer.", "xyz random gibberish 12345", &trace).await;
        assert!(answer.verification_score < 50);
        assert!(answer.sources.is_empty());
        assert!(answer.text.contains("bassa"));
    }

    #[tokio::test]
    async fn high_confidence_attaches_sources_footer() {
        let trace = vec![ToolTraceEntry::new(
            "vector_search",
            json!({}),
            json!({ "results": [{ "text": "KITAS requires a sponsor letter", "metadata": { "title": "KITAS Guide" }, "score": 0.95 }] }),
            true,
            10,
        )];
        let processor = PostProcessor::new(None);
        let answer = processor.process("Ecco la tua risposta.", "Quali documenti servono per il KITAS?", &trace).await;
        assert!(answer.verification_score >= 50);
        assert!(!answer.sources.is_empty());
        assert!(answer.text.contains("## Sources"));
    }
}
