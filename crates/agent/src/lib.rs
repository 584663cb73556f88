//! Agentic orchestration.
//!
//! - Pattern-based intent classification and model-tier routing
//! - Hierarchical conversation memory (working/episodic/semantic), rebuilt
//!   fresh per request from caller-supplied history
//! - The Start/Reasoning/Acting/Finalize state machine that drives a query
//!   end to end, dispatching through the tool registry and handing the
//!   finalized draft to the response post-processor

pub mod intent;
pub mod memory;
pub mod orchestrator;

pub use intent::{classify, DetectedIntent, IntentCategory};
pub use memory::{ConversationMemory, EpisodicSummary, SemanticFact};
pub use orchestrator::{AgentStreamEvent, AgenticOrchestrator, QueryResult};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("llm error: {0}")]
    Llm(#[from] rag_llm::LlmError),

    #[error("tool error: {0}")]
    Tool(#[from] rag_tools::ToolError),
}

impl From<AgentError> for rag_core::Error {
    fn from(err: AgentError) -> Self {
        rag_core::Error::Agent(err.to_string())
    }
}
