//! Cross-encoder reranker trait.

use async_trait::async_trait;

use crate::Result;

/// One candidate passed to the reranker: a stable id plus its text.
pub type RerankCandidate = (String, String);

/// Reranked result: the candidate's id paired with its new relevance score.
pub type RerankScore = (String, f32);

#[async_trait]
pub trait Reranker: Send + Sync + 'static {
    /// Score (query, candidate) pairs and return them reordered by
    /// descending relevance, truncated to `top_k`.
    ///
    /// Reranking is never a hard requirement: on provider failure, callers
    /// fall back to vector-score ordering rather than propagating the
    /// error to the whole query.
    async fn rerank(&self, query: &str, candidates: &[RerankCandidate], top_k: usize) -> Result<Vec<RerankScore>>;
}
