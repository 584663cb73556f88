//! Tool catalog for the agentic orchestrator.
//!
//! A fixed, named registry of operations the orchestrator may invoke —
//! the only side-effecting boundary it may cross. Each tool declares a
//! JSON Schema parameter shape; the registry validates arguments before
//! the handler ever runs.

pub mod calculator;
pub mod catalog;
pub mod mcp;
pub mod registry;

pub use catalog::{CalculatorTool, PricingLookupTool, SqlLookupTool, VectorSearchTool, VisionAnalyzeTool};
pub use mcp::{Tool, ToolError, ToolInput, ToolOutput, ToolSchema};
pub use registry::{ToolExecutor, ToolRegistry};

impl From<ToolError> for rag_core::Error {
    fn from(err: ToolError) -> Self {
        rag_core::Error::Tool(err.to_string())
    }
}
