//! Tool protocol: the shape every orchestrator-invocable tool conforms to.
//!
//! A tool declares its name, description, and JSON Schema parameter shape
//! up front (`ToolSchema`), so the registry can validate arguments before
//! ever calling the handler. This is the only side-effecting boundary the
//! orchestrator may cross.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type ToolInput = Value;
pub type ToolOutput = Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing accepted arguments.
    pub parameters: Value,
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> &ToolSchema;

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError>;
}
