//! Prometheus metrics: request counts, per-stage latency histograms, and
//! the `/metrics` scrape endpoint.

use std::sync::OnceLock;

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Call once at startup.
pub fn init_metrics() {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
        }
        Err(e) => tracing::error!("failed to install Prometheus recorder: {e}"),
    }
}

pub fn record_request(route: &str, status: u16) {
    metrics::counter!("rag_core_requests_total", "route" => route.to_string(), "status" => status.to_string()).increment(1);
}

pub fn record_retrieval_latency(ms: f64) {
    metrics::histogram!("rag_core_retrieval_latency_ms").record(ms);
}

pub fn record_llm_latency(tier: &str, ms: f64) {
    metrics::histogram!("rag_core_llm_latency_ms", "tier" => tier.to_string()).record(ms);
}

pub fn record_tool_latency(tool: &str, ms: f64) {
    metrics::histogram!("rag_core_tool_latency_ms", "tool" => tool.to_string()).record(ms);
}

pub fn record_error(kind: &str) {
    metrics::counter!("rag_core_errors_total", "kind" => kind.to_string()).increment(1);
}

pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => handle.render(),
        None => "metrics recorder not initialized".to_string(),
    }
}
