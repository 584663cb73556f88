//! Tool registry and dispatch: name lookup, schema validation, then
//! execution. Unknown names and malformed arguments both fail before the
//! handler ever runs.

use std::collections::HashMap;
use std::sync::Arc;

use jsonschema::JSONSchema;

use crate::mcp::{Tool, ToolError, ToolInput, ToolOutput, ToolSchema};

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema().clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

/// Validates arguments against a tool's declared schema, then dispatches.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, name: &str, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        Self::validate(&tool.schema().parameters, &input)?;
        tool.execute(input).await
    }

    fn validate(schema: &serde_json::Value, input: &serde_json::Value) -> Result<(), ToolError> {
        let compiled = JSONSchema::compile(schema)
            .map_err(|e| ToolError::InvalidArgs(format!("invalid schema: {e}")))?;

        if let Err(errors) = compiled.validate(input) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(ToolError::InvalidArgs(messages.join("; ")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::ToolSchema;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> &ToolSchema {
            static SCHEMA: std::sync::OnceLock<ToolSchema> = std::sync::OnceLock::new();
            SCHEMA.get_or_init(|| ToolSchema {
                name: "echo".to_string(),
                description: "echoes back its input".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            })
        }

        async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
            Ok(input)
        }
    }

    fn executor() -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        ToolExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let result = executor().execute("nonexistent", json!({})).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn invalid_args_errors_without_running_handler() {
        let result = executor().execute("echo", json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArgs(_))));
    }

    #[tokio::test]
    async fn valid_args_dispatches() {
        let result = executor().execute("echo", json!({"text": "hi"})).await.unwrap();
        assert_eq!(result["text"], "hi");
    }
}
