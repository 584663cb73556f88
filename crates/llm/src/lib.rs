//! Model provider backend and prompt assembly.
//!
//! Features:
//! - Ollama-compatible chat backend with retry/backoff on transient failures
//! - Tiered model routing (Fast / Pro / DeepThink), timeout scaled per tier
//! - Streaming token generation
//! - Prompt assembly from tier, retrieved context, and conversation memory

pub mod backend;
pub mod prompt;

pub use backend::{BackendConfig, FinishReason, GenerationResult, LlmBackend, OllamaBackend};
pub use prompt::{Message, PromptBuilder, Role};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout")]
    Timeout,

    #[error("context too long: {0} > {1}")]
    ContextTooLong(usize, usize),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for rag_core::Error {
    fn from(err: LlmError) -> Self {
        rag_core::Error::Llm(err.to_string())
    }
}
