//! The five tools named in the tool catalog: vector search, calculator,
//! pricing lookup, read-only SQL lookup, and vision analysis.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rag_core::{Retriever, RetrieveOptions};
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::{Column, PgPool, Row, TypeInfo};

use crate::calculator;
use crate::mcp::{Tool, ToolError, ToolInput, ToolOutput, ToolSchema};

pub struct VectorSearchTool {
    retriever: Arc<dyn Retriever>,
    schema: ToolSchema,
}

impl VectorSearchTool {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        let schema = ToolSchema {
            name: "vector_search".to_string(),
            description: "Search the knowledge base for relevant documents".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "collection": { "type": "string" },
                    "top_k": { "type": "integer", "minimum": 1, "maximum": 50 }
                },
                "required": ["query"]
            }),
        };
        Self { retriever, schema }
    }
}

#[async_trait]
impl Tool for VectorSearchTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let query = input["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArgs("query must be a string".to_string()))?;

        let mut options = RetrieveOptions::default();
        if let Some(top_k) = input.get("top_k").and_then(|v| v.as_u64()) {
            options = options.with_top_k(top_k as usize);
        }
        let collection = input.get("collection").and_then(|v| v.as_str());
        if let Some(collection) = collection {
            options = options.with_collection_override(collection);
        }

        let documents = self
            .retriever
            .retrieve(query, &options)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let collection_used = documents
            .first()
            .map(|d| d.source_collection.clone())
            .or_else(|| collection.map(str::to_string))
            .unwrap_or_default();

        let results: Vec<Value> = documents
            .into_iter()
            .map(|d| {
                json!({
                    "text": d.content,
                    "metadata": d.metadata,
                    "score": d.score,
                    "source_collection": d.source_collection,
                })
            })
            .collect();

        Ok(json!({ "results": results, "collection_used": collection_used }))
    }
}

pub struct CalculatorTool {
    schema: ToolSchema,
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self {
            schema: ToolSchema {
                name: "calculator".to_string(),
                description: "Evaluate a numeric expression (+ - * / % and parentheses)".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": { "expression": { "type": "string" } },
                    "required": ["expression"]
                }),
            },
        }
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let expression = input["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArgs("expression must be a string".to_string()))?;

        let result = calculator::evaluate(expression).map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(json!({ "result": result }))
    }
}

pub struct PricingLookupTool {
    retriever: Arc<dyn Retriever>,
    collection: String,
    schema: ToolSchema,
}

impl PricingLookupTool {
    pub fn new(retriever: Arc<dyn Retriever>, collection: impl Into<String>) -> Self {
        let schema = ToolSchema {
            name: "pricing_lookup".to_string(),
            description: "Look up current prices for a named service".to_string(),
            parameters: json!({
                "type": "object",
                "properties": { "service_name": { "type": "string" } }
            }),
        };
        Self { retriever, collection: collection.into(), schema }
    }
}

#[async_trait]
impl Tool for PricingLookupTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let service_name = input.get("service_name").and_then(|v| v.as_str()).unwrap_or("");
        let query = if service_name.is_empty() { "pricing".to_string() } else { service_name.to_string() };

        let options = RetrieveOptions::default()
            .with_top_k(10)
            .with_collection_override(self.collection.clone());

        let documents = self
            .retriever
            .retrieve(&query, &options)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let entries: Vec<Value> = documents
            .into_iter()
            .map(|d| json!({ "text": d.content, "metadata": d.metadata, "score": d.score }))
            .collect();

        Ok(json!({ "entries": entries }))
    }
}

/// Executes a pre-registered, read-only SQL template — never an arbitrary
/// string from the caller — with positional parameters bound in order.
pub struct SqlLookupTool {
    pool: PgPool,
    templates: HashMap<String, String>,
    schema: ToolSchema,
}

impl SqlLookupTool {
    pub fn new(pool: PgPool, templates: HashMap<String, String>) -> Self {
        let schema = ToolSchema {
            name: "sql_lookup".to_string(),
            description: "Run a pre-registered read-only query template against the relational store".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query_template": { "type": "string" },
                    "params": { "type": "array" }
                },
                "required": ["query_template"]
            }),
        };
        Self { pool, templates, schema }
    }

    fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
        let mut object = serde_json::Map::new();
        for column in row.columns() {
            let name = column.name().to_string();
            let value = match column.type_info().name() {
                "INT8" | "INT4" | "INT2" => row
                    .try_get::<Option<i64>, _>(column.ordinal())
                    .ok()
                    .flatten()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                "FLOAT8" | "FLOAT4" | "NUMERIC" => row
                    .try_get::<Option<f64>, _>(column.ordinal())
                    .ok()
                    .flatten()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                "BOOL" => row
                    .try_get::<Option<bool>, _>(column.ordinal())
                    .ok()
                    .flatten()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                _ => row
                    .try_get::<Option<String>, _>(column.ordinal())
                    .ok()
                    .flatten()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            };
            object.insert(name, value);
        }
        Value::Object(object)
    }
}

#[async_trait]
impl Tool for SqlLookupTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let template_name = input["query_template"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArgs("query_template must be a string".to_string()))?;

        let sql = self
            .templates
            .get(template_name)
            .ok_or_else(|| ToolError::InvalidArgs(format!("unregistered query template: {template_name}")))?;

        let params = input.get("params").and_then(|v| v.as_array()).cloned().unwrap_or_default();

        let mut query = sqlx::query(sql);
        for param in &params {
            query = match param {
                Value::String(s) => query.bind(s.clone()),
                Value::Number(n) if n.is_i64() => query.bind(n.as_i64().unwrap()),
                Value::Number(n) => query.bind(n.as_f64().unwrap_or_default()),
                Value::Bool(b) => query.bind(*b),
                Value::Null => query.bind(None::<String>),
                other => query.bind(other.to_string()),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let results: Vec<Value> = rows.iter().map(Self::row_to_json).collect();
        Ok(json!({ "results": results }))
    }
}

pub struct VisionAnalyzeTool {
    client: Client,
    endpoint: String,
    schema: ToolSchema,
}

impl VisionAnalyzeTool {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let schema = ToolSchema {
            name: "vision_analyze".to_string(),
            description: "Analyze an image with a vision-capable model".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "image_ref": { "type": "string" },
                    "prompt": { "type": "string" }
                },
                "required": ["image_ref", "prompt"]
            }),
        };
        Self { client: Client::new(), endpoint: endpoint.into(), schema }
    }
}

#[async_trait]
impl Tool for VisionAnalyzeTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let image_ref = input["image_ref"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArgs("image_ref must be a string".to_string()))?;
        let prompt = input["prompt"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArgs("prompt must be a string".to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "image_ref": image_ref, "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("vision request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::ExecutionFailed(format!("{status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("invalid response body: {e}")))?;

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait as _async_trait;
    use rag_core::Document;

    struct FakeRetriever {
        documents: Vec<Document>,
    }

    #[_async_trait]
    impl Retriever for FakeRetriever {
        async fn retrieve(&self, _query: &str, _options: &RetrieveOptions) -> rag_core::Result<Vec<Document>> {
            Ok(self.documents.clone())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test]
    async fn vector_search_maps_documents_to_results() {
        let retriever = Arc::new(FakeRetriever {
            documents: vec![Document::new("1", "KITAS requirements", 0.9, "visa_kb")],
        });
        let tool = VectorSearchTool::new(retriever);

        let output = tool.execute(json!({ "query": "kitas" })).await.unwrap();
        assert_eq!(output["collection_used"], "visa_kb");
        assert_eq!(output["results"][0]["text"], "KITAS requirements");
    }

    #[tokio::test]
    async fn calculator_tool_evaluates_expression() {
        let tool = CalculatorTool::default();
        let output = tool.execute(json!({ "expression": "2 + 2 * 3" })).await.unwrap();
        assert_eq!(output["result"], 8.0);
    }

    #[tokio::test]
    async fn calculator_tool_rejects_missing_expression() {
        let tool = CalculatorTool::default();
        let result = tool.execute(json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArgs(_))));
    }
}
