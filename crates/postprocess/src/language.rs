//! Enforces that the draft's dominant language matches the query's.
//!
//! Detection reuses the same marker-count heuristic as the query analyzer,
//! applied to the draft itself; a mismatch triggers a single re-translation
//! call through whichever model backend the post-processor was built with.

use std::sync::Arc;

use rag_config::ModelTier;
use rag_core::{detect_language, Language};
use rag_llm::{LlmBackend, Message};

/// Re-translates `draft` into `target` using the Fast tier — a re-translation
/// pass is a mechanical transform, not a reasoning task.
async fn retranslate(llm: &Arc<dyn LlmBackend>, draft: &str, target: Language) -> Option<String> {
    let instruction = format!(
        "Translate the following answer into {} preserving its meaning, formatting, and any [n] citation markers exactly:\n\n{draft}",
        target
    );
    match llm.generate(&[Message::user(instruction)], ModelTier::Fast).await {
        Ok(result) => Some(result.text),
        Err(e) => {
            tracing::warn!("re-translation pass failed, keeping original draft: {e}");
            None
        }
    }
}

/// If the draft's detected language doesn't match the query's, attempts a
/// best-effort re-translation. On failure or with no backend configured,
/// the original draft is kept — a language mismatch degrades the answer
/// but is not worth failing the whole turn over.
pub async fn enforce_language(draft: &str, query_language: Language, llm: Option<&Arc<dyn LlmBackend>>) -> String {
    let draft_language = detect_language(draft);
    if draft_language == query_language {
        return draft.to_string();
    }

    match llm {
        Some(backend) => retranslate(backend, draft, query_language).await.unwrap_or_else(|| draft.to_string()),
        None => draft.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matching_language_is_unchanged() {
        let draft = "Ciao, ecco la risposta.";
        let result = enforce_language(draft, Language::It, None).await;
        assert_eq!(result, draft);
    }

    #[tokio::test]
    async fn mismatch_without_backend_keeps_draft() {
        let draft = "Hello, here is the answer, the cost is clear, please understand.";
        let result = enforce_language(draft, Language::It, None).await;
        assert_eq!(result, draft);
    }
}
