//! Vector store adapter: a thin REST client over Qdrant's HTTP API, plus a
//! pure translation from the filter-dict the search service builds into
//! Qdrant's filter grammar. The translation is exercised directly in tests
//! without needing a live store.

use std::collections::HashMap;

use async_trait::async_trait;
use rag_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    pub endpoint: String,
    pub timeout: std::time::Duration,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:6333".to_string(),
            timeout: std::time::Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: HashMap<String, Value>,
}

/// A single equality/comparison constraint on a payload field. Kept as a
/// plain enum rather than a backend-specific type so callers never build
/// Qdrant JSON directly.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Gte(Value),
    Lte(Value),
    In(Vec<Value>),
}

#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    pub constraints: Vec<(String, FilterOp)>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.constraints.push((field.into(), op));
        self
    }
}

/// Translate a filter-dict into Qdrant's `must` clause grammar. Pure and
/// independently testable: no network, no store handle.
pub fn translate_filter(filter: &MetadataFilter) -> Value {
    let must: Vec<Value> = filter
        .constraints
        .iter()
        .map(|(field, op)| match op {
            FilterOp::Eq(v) => serde_json::json!({ "key": field, "match": { "value": v } }),
            FilterOp::Gte(v) => serde_json::json!({ "key": field, "range": { "gte": v } }),
            FilterOp::Lte(v) => serde_json::json!({ "key": field, "range": { "lte": v } }),
            FilterOp::In(values) => serde_json::json!({ "key": field, "match": { "any": values } }),
        })
        .collect();

    serde_json::json!({ "must": must })
}

#[async_trait]
pub trait VectorStoreClient: Send + Sync + 'static {
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<StoredPoint>>;
}

#[derive(Clone)]
pub struct QdrantStoreClient {
    client: Client,
    config: VectorStoreConfig,
}

impl QdrantStoreClient {
    pub fn new(config: VectorStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Store(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn points_search_url(&self, collection: &str) -> String {
        format!("{}/collections/{}/points/search", self.config.endpoint, collection)
    }
}

#[async_trait]
impl VectorStoreClient for QdrantStoreClient {
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<StoredPoint>> {
        let request = QdrantSearchRequest {
            vector: vector.to_vec(),
            limit: top_k,
            with_payload: true,
            filter: filter.map(translate_filter),
        };

        let response = self
            .client
            .post(self.points_search_url(collection))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Store(format!("search request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!("{status}: {body}")));
        }

        let parsed: QdrantSearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("invalid response body: {e}")))?;

        Ok(parsed
            .result
            .into_iter()
            .map(|p| StoredPoint {
                id: p.id,
                score: p.score,
                payload: p.payload,
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct QdrantSearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QdrantSearchResponse {
    result: Vec<QdrantPoint>,
}

#[derive(Debug, Deserialize)]
struct QdrantPoint {
    #[serde(deserialize_with = "deserialize_point_id")]
    id: String,
    score: f32,
    #[serde(default)]
    payload: HashMap<String, Value>,
}

fn deserialize_point_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_filter_builds_must_clause() {
        let filter = MetadataFilter::new()
            .with("domain", FilterOp::Eq(Value::String("visa".into())))
            .with("tier", FilterOp::Gte(Value::from(1)));

        let translated = translate_filter(&filter);
        let must = translated["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["key"], "domain");
        assert_eq!(must[1]["range"]["gte"], 1);
    }

    #[test]
    fn translate_empty_filter_has_empty_must() {
        let filter = MetadataFilter::new();
        let translated = translate_filter(&filter);
        assert!(translated["must"].as_array().unwrap().is_empty());
    }

    #[test]
    fn translate_in_filter_uses_match_any() {
        let filter = MetadataFilter::new().with(
            "collection",
            FilterOp::In(vec![Value::String("a".into()), Value::String("b".into())]),
        );
        let translated = translate_filter(&filter);
        assert_eq!(translated["must"][0]["match"]["any"].as_array().unwrap().len(), 2);
    }
}
