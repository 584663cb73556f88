//! Derives a 0-100 verification score from the evidence gathered during
//! the turn: aggregate source similarity, how many distinct documents
//! back the answer, whether any of them are domain-authoritative, and
//! tool success rate.

use crate::types::{Source, ToolTraceEntry, VerificationTier};

/// Weight given to the mean relevance score of the top-k sources.
const TOP_K_SIMILARITY_WEIGHT: f32 = 50.0;
/// Weight given to the fraction of tool calls that succeeded.
const TOOL_SUCCESS_WEIGHT: f32 = 25.0;
/// Weight given to how many distinct source documents back the answer,
/// saturating once `DISTINCT_SOURCE_SATURATION` is reached.
const DISTINCT_SOURCE_WEIGHT: f32 = 15.0;
/// Weight given to the presence of at least one domain-authoritative source.
const AUTHORITATIVE_WEIGHT: f32 = 10.0;

/// Number of sources in each answer's aggregate similarity figure, and the
/// distinct-source count past which the distinct-source term maxes out.
const TOP_K: usize = 3;
const DISTINCT_SOURCE_SATURATION: usize = 3;

/// Computes the 0-100 verification score and its confidence tier.
///
/// With no sources and no tool calls at all (e.g. small talk), the score
/// defaults to a neutral value that does not trigger the low-confidence
/// banner, since citations are not expected for that turn.
pub fn compute_verification_score(sources: &[Source], tool_trace: &[ToolTraceEntry]) -> (u8, VerificationTier) {
    if sources.is_empty() && tool_trace.is_empty() {
        let score = 100u8;
        return (score, VerificationTier::from_score(score));
    }

    let mut by_score: Vec<f32> = sources.iter().map(|s| s.score).collect();
    by_score.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let top_k = &by_score[..by_score.len().min(TOP_K)];
    let top_k_similarity = if top_k.is_empty() { 0.0 } else { top_k.iter().sum::<f32>() / top_k.len() as f32 };

    let distinct_source_ratio =
        (sources.len().min(DISTINCT_SOURCE_SATURATION) as f32) / DISTINCT_SOURCE_SATURATION as f32;

    let has_authoritative_source = if sources.iter().any(|s| s.authoritative) { 1.0 } else { 0.0 };

    let tool_success_ratio = if tool_trace.is_empty() {
        1.0
    } else {
        tool_trace.iter().filter(|t| t.ok).count() as f32 / tool_trace.len() as f32
    };

    let raw = top_k_similarity * TOP_K_SIMILARITY_WEIGHT
        + tool_success_ratio * TOOL_SUCCESS_WEIGHT
        + distinct_source_ratio * DISTINCT_SOURCE_WEIGHT
        + has_authoritative_source * AUTHORITATIVE_WEIGHT;
    let score = raw.clamp(0.0, 100.0).round() as u8;

    (score, VerificationTier::from_score(score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_evidence_is_neutral_confidence() {
        let (score, tier) = compute_verification_score(&[], &[]);
        assert_eq!(score, 100);
        assert_eq!(tier, VerificationTier::High);
    }

    fn source(score: f32, authoritative: bool) -> Source {
        Source { title: "A".into(), snippet: "s".into(), url: None, score, authoritative }
    }

    #[test]
    fn strong_sources_and_successful_tools_scores_high() {
        let sources = vec![source(0.95, true), source(0.9, false), source(0.9, false)];
        let trace = vec![ToolTraceEntry::new("vector_search", serde_json::json!({}), serde_json::json!({}), true, 1)];
        let (score, tier) = compute_verification_score(&sources, &trace);
        assert!(score >= 80);
        assert_eq!(tier, VerificationTier::High);
    }

    #[test]
    fn weak_source_scores_low() {
        let sources = vec![source(0.1, false)];
        let trace = vec![ToolTraceEntry::new("vector_search", serde_json::json!({}), serde_json::json!({}), true, 1)];
        let (score, tier) = compute_verification_score(&sources, &trace);
        assert!(score < 50);
        assert_eq!(tier, VerificationTier::Low);
    }

    #[test]
    fn more_distinct_sources_scores_higher_at_equal_similarity() {
        let trace = vec![ToolTraceEntry::new("vector_search", serde_json::json!({}), serde_json::json!({}), true, 1)];
        let (one_source_score, _) = compute_verification_score(&[source(0.8, false)], &trace);
        let (three_source_score, _) =
            compute_verification_score(&[source(0.8, false), source(0.8, false), source(0.8, false)], &trace);
        assert!(three_source_score > one_source_score);
    }

    #[test]
    fn authoritative_source_scores_higher_than_unranked_at_equal_similarity() {
        let trace = vec![ToolTraceEntry::new("vector_search", serde_json::json!({}), serde_json::json!({}), true, 1)];
        let (unranked_score, _) = compute_verification_score(&[source(0.8, false)], &trace);
        let (authoritative_score, _) = compute_verification_score(&[source(0.8, true)], &trace);
        assert!(authoritative_score > unranked_score);
    }
}
