//! Model provider backend.
//!
//! Contract: given role-tagged messages and a model tier, return either a
//! full response or a token-delta stream. Tier selects both the model name
//! and the request timeout (`DeepThink` gets a longer budget for its
//! multi-step reasoning prompt).

use std::time::Duration;

use async_trait::async_trait;
use rag_config::{LlmConfig, ModelTier};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::prompt::Message;
use crate::LlmError;

/// Runtime settings for an `OllamaBackend` not already covered by
/// `rag_config::LlmConfig` (which only carries model names and sampling
/// parameters, since that part is meant to be hot-reloadable data).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub llm: LlmConfig,
    pub top_p: f32,
    pub timeout: Duration,
    pub deep_think_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            top_p: 0.9,
            timeout: Duration::from_secs(60),
            deep_think_timeout: Duration::from_secs(180),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl BackendConfig {
    fn timeout_for(&self, tier: ModelTier) -> Duration {
        match tier {
            ModelTier::DeepThink => self.deep_think_timeout,
            _ => self.timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub tokens: usize,
    pub time_to_first_token_ms: u64,
    pub total_time_ms: u64,
    pub tokens_per_second: f32,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Error,
    Cancelled,
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a complete response for the given tier.
    async fn generate(&self, messages: &[Message], tier: ModelTier) -> Result<GenerationResult, LlmError>;

    /// Generate a response, forwarding each text delta on `tx` as it arrives.
    async fn generate_stream(
        &self,
        messages: &[Message],
        tier: ModelTier,
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError>;

    async fn is_available(&self) -> bool;

    fn model_for(&self, tier: ModelTier) -> &str;

    fn estimate_tokens(&self, text: &str) -> usize {
        text.len() / 4
    }
}

/// Ollama-compatible chat backend, shared across all three model tiers.
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    config: BackendConfig,
}

impl OllamaBackend {
    pub fn new(config: BackendConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.llm.endpoint, path)
    }

    async fn execute_request(
        &self,
        request: &OllamaChatRequest,
        timeout: Duration,
    ) -> Result<OllamaChatResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .timeout(timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {error}")));
            }
            return Err(LlmError::Api(error));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }

    fn request_for(&self, messages: &[Message], tier: ModelTier, stream: bool) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.llm.model_for(tier).to_string(),
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream,
            options: Some(OllamaOptions {
                temperature: Some(self.config.llm.temperature),
                top_p: Some(self.config.top_p),
                num_predict: Some(self.config.llm.max_tokens as i32),
            }),
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, messages: &[Message], tier: ModelTier) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();
        let request = self.request_for(messages, tier, false);
        let timeout = self.config.timeout_for(tier);

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max_retries = self.config.max_retries,
                    ?backoff,
                    "LLM request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&request, timeout).await {
                Ok(result) => {
                    let total_time = start.elapsed();
                    return Ok(GenerationResult {
                        text: result.message.content,
                        tokens: result.eval_count.unwrap_or(0) as usize,
                        time_to_first_token_ms: result.prompt_eval_duration.unwrap_or(0) / 1_000_000,
                        total_time_ms: total_time.as_millis() as u64,
                        tokens_per_second: result.eval_count.unwrap_or(0) as f32
                            / (result.eval_duration.unwrap_or(1) as f32 / 1e9),
                        finish_reason: if result.done { FinishReason::Stop } else { FinishReason::Length },
                    });
                }
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("max retries exceeded".to_string())))
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        tier: ModelTier,
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();
        let mut first_token_time = None;
        let mut total_tokens = 0;
        let mut full_response = String::new();

        let request = self.request_for(messages, tier, true);
        let timeout = self.config.timeout_for(tier);

        let response = self
            .client
            .post(self.api_url("/chat"))
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(error));
        }

        let mut stream = response.bytes_stream();
        use futures::StreamExt;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let text = String::from_utf8_lossy(&chunk);

            for line in text.lines() {
                if line.is_empty() {
                    continue;
                }

                if let Ok(chunk_response) = serde_json::from_str::<OllamaStreamChunk>(line) {
                    if first_token_time.is_none() {
                        first_token_time = Some(start.elapsed());
                    }

                    let token = &chunk_response.message.content;
                    full_response.push_str(token);
                    total_tokens += 1;

                    if tx.send(token.clone()).await.is_err() {
                        return Ok(GenerationResult {
                            text: full_response,
                            tokens: total_tokens,
                            time_to_first_token_ms: first_token_time.map(|t| t.as_millis() as u64).unwrap_or(0),
                            total_time_ms: start.elapsed().as_millis() as u64,
                            tokens_per_second: 0.0,
                            finish_reason: FinishReason::Cancelled,
                        });
                    }

                    if chunk_response.done {
                        break;
                    }
                }
            }
        }

        let total_time = start.elapsed();

        Ok(GenerationResult {
            text: full_response,
            tokens: total_tokens,
            time_to_first_token_ms: first_token_time.map(|t| t.as_millis() as u64).unwrap_or(0),
            total_time_ms: total_time.as_millis() as u64,
            tokens_per_second: total_tokens as f32 / total_time.as_secs_f32(),
            finish_reason: FinishReason::Stop,
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.config.llm.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        self.config.llm.model_for(tier)
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    done: bool,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    eval_duration: Option<u64>,
    #[serde(default)]
    prompt_eval_duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    message: OllamaMessage,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Role;

    #[test]
    fn config_default_selects_pro_timeout() {
        let config = BackendConfig::default();
        assert_eq!(config.timeout_for(ModelTier::Fast), config.timeout);
        assert_eq!(config.timeout_for(ModelTier::DeepThink), config.deep_think_timeout);
        assert!(config.deep_think_timeout > config.timeout);
    }

    #[test]
    fn message_conversion() {
        let msg = Message { role: Role::User, content: "Hello".to_string() };
        let ollama_msg = OllamaMessage::from(&msg);
        assert_eq!(ollama_msg.role, "user");
        assert_eq!(ollama_msg.content, "Hello");
    }

    #[test]
    fn model_for_resolves_tier() {
        let config = BackendConfig::default();
        let backend = OllamaBackend::new(config).unwrap();
        assert_ne!(backend.model_for(ModelTier::Fast), backend.model_for(ModelTier::DeepThink));
    }
}
