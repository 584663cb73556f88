//! Cross-encoder reranker with early exit: once a candidate's score clears
//! the confidence threshold, remaining candidates keep their vector-search
//! order instead of paying for a full rescore.

use async_trait::async_trait;
use rag_core::{Error, RerankCandidate, RerankScore, Reranker, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RerankerConfig {
    pub endpoint: String,
    pub model: String,
    pub early_exit_enabled: bool,
    pub confidence_threshold: f32,
    pub timeout: std::time::Duration,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081".to_string(),
            model: "bge-reranker-base".to_string(),
            early_exit_enabled: true,
            confidence_threshold: 0.9,
            timeout: std::time::Duration::from_secs(10),
        }
    }
}

/// Cross-encoder reranker calling an external scoring service one
/// candidate at a time, stopping early once a score clears the
/// confidence threshold.
#[derive(Clone)]
pub struct CrossEncoderReranker {
    client: Client,
    config: RerankerConfig,
}

impl CrossEncoderReranker {
    pub fn new(config: RerankerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Search(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    async fn score_one(&self, query: &str, candidate: &str) -> Result<f32> {
        let request = ScoreRequest {
            model: self.config.model.clone(),
            query: query.to_string(),
            passage: candidate.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/rerank", self.config.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Search(format!("rerank request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Search(format!("{status}: {body}")));
        }

        let parsed: ScoreResponse = response
            .json()
            .await
            .map_err(|e| Error::Search(format!("invalid response body: {e}")))?;

        Ok(parsed.score)
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    async fn rerank(&self, query: &str, candidates: &[RerankCandidate], top_k: usize) -> Result<Vec<RerankScore>> {
        let mut scored: Vec<RerankScore> = Vec::with_capacity(candidates.len());

        for (id, text) in candidates {
            let score = self.score_one(query, text).await?;
            let exit_now = self.config.early_exit_enabled && score >= self.config.confidence_threshold;
            scored.push((id.clone(), score));
            if exit_now {
                break;
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[derive(Debug, Serialize)]
struct ScoreRequest {
    model: String,
    query: String,
    passage: String,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f32,
}

/// Lexical-overlap scorer used as a fallback when the cross-encoder
/// service is unavailable: cheap, local, no network round trip.
pub struct SimpleScorer;

impl SimpleScorer {
    pub fn score(query: &str, candidate: &str) -> f32 {
        let query_terms: std::collections::HashSet<&str> =
            query.to_lowercase().split_whitespace().collect::<Vec<_>>().into_iter().collect();
        let candidate_lower = candidate.to_lowercase();

        if query_terms.is_empty() {
            return 0.0;
        }

        let matches = query_terms
            .iter()
            .filter(|t| candidate_lower.contains(**t))
            .count();

        matches as f32 / query_terms.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_scorer_counts_term_overlap() {
        let score = SimpleScorer::score("visa extension kitas", "how to extend a kitas visa");
        assert!(score > 0.5);
    }

    #[test]
    fn simple_scorer_zero_overlap() {
        let score = SimpleScorer::score("visa extension", "quarterly tax filing deadlines");
        assert_eq!(score, 0.0);
    }
}
