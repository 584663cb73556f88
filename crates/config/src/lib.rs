//! Configuration management for the agentic RAG core
//!
//! Supports loading configuration from:
//! - YAML/TOML files
//! - Environment variables (`RAG_CORE__` prefix, double-underscore separated)
//! - Runtime overrides

pub mod agent;
pub mod domain;
pub mod prompts;
pub mod settings;

pub use agent::{AgentConfig, EarlyExitConfig, LlmConfig, MemoryConfig, SearchConfig};
pub use domain::{DomainKeyword, RoutingConfig};
pub use prompts::{FallbackTemplates, ModelTier, PromptTemplates, SystemPrompt, TierPrompt};
pub use settings::{load_settings, DatabaseConfig, RateLimitConfig, ServerConfig, Settings};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
