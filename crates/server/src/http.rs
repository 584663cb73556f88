//! HTTP endpoints: the SSE query endpoint, the knowledge-search endpoint,
//! session CRUD, and health/readiness/metrics.

use std::convert::Infallible;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use rag_agent::AgentStreamEvent;
use rag_core::{RetrieveOptions, Turn};

use crate::auth::auth_middleware;
use crate::metrics::{metrics_handler, record_request};
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.read().server.cors_origins, state.settings.read().server.cors_enabled);

    Router::new()
        .route("/api/query", post(query_stream))
        .route("/api/search", post(knowledge_search))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id", delete(delete_session))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::compression::CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    if !enabled {
        tracing::warn!("CORS is disabled — allowing all origins (do not use in production)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect();
    if parsed.is_empty() {
        tracing::error!("all configured CORS origins are invalid, falling back to localhost");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    session_id: Option<String>,
    query: String,
}

/// Streams `token`/`tool_start`/`tool_end`/`sources`/`verification` events
/// for one query, terminated by `done` (or `cancelled` if the client
/// disconnects mid-flight). The finalized answer is appended to the
/// session's history once the stream completes.
async fn query_stream(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let session = match request.session_id {
        Some(id) => state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?,
        None => state.sessions.create().map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?,
    };

    session.touch();
    session.push_turn(Turn::user(request.query.clone()));
    let history = session.history();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<AgentStreamEvent>(64);
    let (out_tx, out_rx) = tokio::sync::mpsc::channel::<AgentStreamEvent>(64);
    let cancel = Arc::new(AtomicBool::new(false));

    let orchestrator = state.orchestrator.clone();
    let query = request.query.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.process_query_stream(&query, &history, tx.clone(), cancel).await {
            tracing::error!("query stream failed: {e}");
            record_request("/api/query", 500);
            let _ = tx.send(AgentStreamEvent::Token(format!("[error: {e}]"))).await;
            let _ = tx.send(AgentStreamEvent::Done).await;
        }
    });

    // Tees events through to the client while accumulating the draft text
    // so the finalized answer can be persisted once the stream ends.
    tokio::spawn(async move {
        let mut draft = String::new();
        while let Some(event) = rx.recv().await {
            if let AgentStreamEvent::Token(ref text) = event {
                draft.push_str(text);
            }
            let terminal = matches!(event, AgentStreamEvent::Done | AgentStreamEvent::Cancelled);
            if out_tx.send(event).await.is_err() {
                break;
            }
            if terminal {
                if !draft.is_empty() {
                    session.push_turn(Turn::assistant(draft));
                }
                break;
            }
        }
    });

    record_request("/api/query", 200);

    let stream = ReceiverStream::new(out_rx).map(|event| Ok(to_sse_event(&event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &AgentStreamEvent) -> Event {
    match event {
        AgentStreamEvent::Token(text) => Event::default().event("token").data(text.clone()),
        AgentStreamEvent::ToolStart { tool, args } => {
            Event::default().event("tool_start").data(serde_json::json!({ "tool": tool, "args": args }).to_string())
        }
        AgentStreamEvent::ToolEnd { tool, ok, latency_ms } => {
            Event::default().event("tool_end").data(serde_json::json!({ "tool": tool, "ok": ok, "latency_ms": latency_ms }).to_string())
        }
        AgentStreamEvent::Sources(sources) => {
            Event::default().event("sources").data(serde_json::to_string(sources).unwrap_or_default())
        }
        AgentStreamEvent::Verification { score, tier } => {
            Event::default().event("verification").data(serde_json::json!({ "score": score, "tier": tier }).to_string())
        }
        AgentStreamEvent::Done => Event::default().event("done").data("[DONE]"),
        AgentStreamEvent::Cancelled => Event::default().event("cancelled").data("[DONE]"),
    }
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default)]
    tier_filter: Option<String>,
    #[serde(default)]
    collection_override: Option<String>,
    #[serde(default)]
    user_level: u8,
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<rag_core::Document>,
    total_found: usize,
    user_level: u8,
    execution_time_ms: u64,
}

async fn knowledge_search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Result<Json<SearchResponse>, StatusCode> {
    let options = RetrieveOptions {
        top_k: request.top_k,
        user_level: request.user_level,
        tier_filter: request.tier_filter,
        collection_override: request.collection_override,
    };

    let start = Instant::now();
    let results = state.retriever.retrieve(&request.query, &options).await.map_err(|e| {
        tracing::error!("knowledge search failed: {e}");
        record_request("/api/search", 500);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let execution_time_ms = start.elapsed().as_millis() as u64;
    record_request("/api/search", 200);

    Ok(Json(SearchResponse { query: request.query, total_found: results.len(), results, user_level: request.user_level, execution_time_ms }))
}

#[derive(Debug, Serialize)]
struct SessionView {
    id: String,
    turn_count: usize,
}

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionView>, StatusCode> {
    let session = state.sessions.create().map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(SessionView { id: session.id.clone(), turn_count: session.turn_count() }))
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<SessionView>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(SessionView { id: session.id.clone(), turn_count: session.turn_count() }))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.sessions.remove(&id);
    StatusCode::NO_CONTENT
}

async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ids = state.sessions.list();
    Json(serde_json::json!({ "sessions": ids, "count": ids.len() }))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ready", "sessions": state.sessions.count() }))
}
