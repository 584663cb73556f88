//! Agent configuration

use serde::{Deserialize, Serialize};

use crate::prompts::ModelTier;

/// Top-level orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Assistant name for introductions
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Default language
    #[serde(default = "default_agent_language")]
    pub language: String,

    /// Maximum number of tool invocations per turn before the orchestrator
    /// forces a finalize step.
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_agent_name() -> String {
    "Zantara".to_string()
}
fn default_agent_language() -> String {
    "en".to_string()
}
fn default_max_tool_calls() -> u32 {
    6
}
fn default_true() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            language: default_agent_language(),
            max_tool_calls: default_max_tool_calls(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

/// LLM configuration: one model per tier, routed to by the intent classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API endpoint (Ollama-compatible)
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model used for `ModelTier::Fast`
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Model used for `ModelTier::Pro`
    #[serde(default = "default_pro_model")]
    pub pro_model: String,

    /// Model used for `ModelTier::DeepThink`
    #[serde(default = "default_deep_think_model")]
    pub deep_think_model: String,

    /// API key (for cloud providers)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_fast_model() -> String {
    "qwen2.5:1.5b-instruct-q4_K_M".to_string()
}
fn default_pro_model() -> String {
    "qwen2.5:7b-instruct-q4_K_M".to_string()
}
fn default_deep_think_model() -> String {
    "qwen2.5:32b-instruct-q4_K_M".to_string()
}
fn default_max_tokens() -> usize {
    1024
}
fn default_temperature() -> f32 {
    0.3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            fast_model: default_fast_model(),
            pro_model: default_pro_model(),
            deep_think_model: default_deep_think_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// Resolve the model name to use for a given tier.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Pro => &self.pro_model,
            ModelTier::DeepThink => &self.deep_think_model,
        }
    }
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Vector store endpoint
    #[serde(default = "default_vector_store_endpoint")]
    pub vector_store_endpoint: String,

    /// Number of results returned to callers
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Oversampling factor applied before reranking/dedup
    #[serde(default = "default_oversample_factor")]
    pub oversample_factor: usize,

    /// Minimum relevance score for inclusion
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Enable cross-encoder reranking
    #[serde(default = "default_true")]
    pub reranking_enabled: bool,

    /// Early exit configuration
    #[serde(default)]
    pub early_exit: EarlyExitConfig,

    /// Single-flight cache TTL, in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

fn default_vector_store_endpoint() -> String {
    "http://localhost:6333".to_string()
}
fn default_top_k() -> usize {
    5
}
fn default_oversample_factor() -> usize {
    4
}
fn default_min_score() -> f32 {
    0.5
}
fn default_cache_ttl_seconds() -> u64 {
    300
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_store_endpoint: default_vector_store_endpoint(),
            top_k: default_top_k(),
            oversample_factor: default_oversample_factor(),
            min_score: default_min_score(),
            reranking_enabled: true,
            early_exit: EarlyExitConfig::default(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

/// Reranker early-exit configuration: stop scoring remaining candidates
/// once a result crosses the confidence threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyExitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Confidence threshold above which reranking stops early
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

fn default_confidence_threshold() -> f32 {
    0.9
}

impl Default for EarlyExitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Working memory size (recent turns)
    #[serde(default = "default_working_memory")]
    pub working_memory_size: usize,

    /// Summarization threshold (turns before summarizing)
    #[serde(default = "default_summarization_threshold")]
    pub summarization_threshold: usize,

    /// Maximum episodic summaries to keep
    #[serde(default = "default_max_summaries")]
    pub max_episodic_summaries: usize,

    /// Enable semantic memory (slot-filled facts)
    #[serde(default = "default_true")]
    pub semantic_memory_enabled: bool,
}

fn default_working_memory() -> usize {
    20
}
fn default_summarization_threshold() -> usize {
    12
}
fn default_max_summaries() -> usize {
    20
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            working_memory_size: default_working_memory(),
            summarization_threshold: default_summarization_threshold(),
            max_episodic_summaries: default_max_summaries(),
            semantic_memory_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_for_resolves_each_tier() {
        let llm = LlmConfig::default();
        assert_eq!(llm.model_for(ModelTier::Fast), llm.fast_model);
        assert_eq!(llm.model_for(ModelTier::Pro), llm.pro_model);
        assert_eq!(llm.model_for(ModelTier::DeepThink), llm.deep_think_model);
    }

    #[test]
    fn default_early_exit_threshold_is_high_confidence() {
        let search = SearchConfig::default();
        assert!(search.early_exit.confidence_threshold >= 0.9);
    }
}
