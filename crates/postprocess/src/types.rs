//! Shared types passed between post-processor stages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in the orchestrator's tool-call trace, fed into the
/// post-processor so it can attach citations and score confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTraceEntry {
    pub tool: String,
    pub args: Value,
    pub result: Value,
    pub ok: bool,
    pub latency_ms: u64,
}

impl ToolTraceEntry {
    pub fn new(tool: impl Into<String>, args: Value, result: Value, ok: bool, latency_ms: u64) -> Self {
        Self { tool: tool.into(), args, result, ok, latency_ms }
    }
}

/// A citable source surfaced in the answer's "Sources" footer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub score: f32,
    /// Whether the backing document carried domain-authoritative metadata
    /// (e.g. an `authority_tier`), as opposed to an unranked scrape.
    #[serde(default)]
    pub authoritative: bool,
}

/// Confidence band derived from the verification score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationTier {
    High,
    Medium,
    Low,
}

impl VerificationTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=100 => VerificationTier::High,
            50..=79 => VerificationTier::Medium,
            _ => VerificationTier::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationTier::High => "high",
            VerificationTier::Medium => "medium",
            VerificationTier::Low => "low",
        }
    }
}

/// The finalized, customer-facing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedAnswer {
    pub text: String,
    pub sources: Vec<Source>,
    pub verification_score: u8,
    pub verification_tier: VerificationTier,
}
