//! Embedding gateway: turns text into vectors over an HTTP embedding
//! service, with exponential-backoff retry on transient failures.
//!
//! Retry/backoff shape mirrors the LLM backend's chat client: 5xx and
//! connection errors are retryable, 4xx are not.

use std::time::Duration;

use async_trait::async_trait;
use rag_core::{Embedder, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub dimension: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimension: 1536,
            timeout: Duration::from_secs(15),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

/// Embedder backed by an Ollama-compatible `/api/embeddings` endpoint.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    client: Client,
    config: EmbeddingConfig,
}

impl HttpEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Embedding(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!("{}/api/embeddings", self.config.endpoint)
    }

    async fn execute_request(&self, prompt: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
        };

        let response = self
            .client
            .post(self.api_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(Error::Embedding(format!("transient: {status} {body}")));
            }
            return Err(Error::Embedding(format!("permanent: {status} {body}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("invalid response body: {e}")))?;

        Ok(parsed.embedding)
    }

    fn is_retryable(error: &Error) -> bool {
        matches!(error, Error::Embedding(msg) if msg.starts_with("transient"))
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max_retries = self.config.max_retries,
                    ?backoff,
                    "embedding request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Embedding("max retries exceeded".into())))
    }
}

#[async_trait]
impl Embedder for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_retry(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let futures = texts.iter().map(|t| self.embed_with_retry(t));
        futures::future::try_join_all(futures).await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// Deterministic embedder for tests: hashes the text into a fixed-dimension
/// vector so equal inputs always produce equal vectors without a live
/// embedding service.
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(1536)
    }
}

#[async_trait]
impl Embedder for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dimension] += byte as f32 / 255.0;
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbeddingProvider::new(64);
        let a = embedder.embed("KITAS extension process").await.unwrap();
        let b = embedder.embed("KITAS extension process").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn mock_embedder_batch_preserves_order() {
        let embedder = MockEmbeddingProvider::new(32);
        let batch = embedder
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        let individually = vec![
            embedder.embed("one").await.unwrap(),
            embedder.embed("two").await.unwrap(),
        ];
        assert_eq!(batch, individually);
    }
}
