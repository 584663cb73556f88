//! Top-level settings loader: layers defaults, an optional file, and
//! environment variables into one `Settings` value.

use serde::{Deserialize, Serialize};

use crate::{AgentConfig, ConfigError};
use crate::domain::RoutingConfig;
use crate::prompts::PromptTemplates;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout_seconds() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout_seconds(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

/// API key authentication for the HTTP surface. Disabled by default for
/// local development; production deployments set `enabled = true` and an
/// `api_key` via environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/ready".to_string(), "/metrics".to_string()]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { enabled: false, api_key: None, public_paths: default_public_paths() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_true() -> bool {
    true
}
fn default_requests_per_minute() -> u32 {
    60
}
fn default_burst() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: default_requests_per_minute(),
            burst: default_burst(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "postgres://localhost/rag_core".to_string()
}
fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Complete application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub prompts: PromptTemplates,
}

/// Load settings by layering, in increasing priority:
/// 1. Built-in defaults (`Settings::default()`)
/// 2. An optional `config/default.{toml,yaml}` file relative to the
///    current directory
/// 3. Environment variables prefixed `RAG_CORE__`, double-underscore
///    separated (e.g. `RAG_CORE__SERVER__PORT=9000`)
pub fn load_settings() -> Result<Settings, ConfigError> {
    let built = config::Config::builder()
        .add_source(config::Config::try_from(&Settings::default()).map_err(ConfigError::from)?)
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name("config/local").required(false))
        .add_source(
            config::Environment::with_prefix("RAG_CORE")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(ConfigError::from)?;

    built.try_deserialize().map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_has_sane_port() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn load_settings_succeeds_with_no_file_present() {
        let settings = load_settings();
        assert!(settings.is_ok());
    }
}
