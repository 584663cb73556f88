//! HTTP/SSE server for the agentic advisory Q&A system.
//!
//! Wires the orchestrator, retriever, and session store behind an axum
//! router with auth, rate-limiting, tracing, and Prometheus metrics layers.

pub mod auth;
pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod session;
pub mod state;

pub use auth::auth_middleware;
pub use http::create_router;
pub use metrics::{
    init_metrics, metrics_handler, record_error, record_llm_latency, record_request,
    record_retrieval_latency, record_tool_latency,
};
pub use rate_limit::{rate_limit_middleware, RateLimiter, RateLimitError};
pub use session::{Session, SessionManager};
pub use state::AppState;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("session error: {0}")]
    Session(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Session(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::Auth(_) => axum::http::StatusCode::UNAUTHORIZED,
            ServerError::RateLimit => axum::http::StatusCode::TOO_MANY_REQUESTS,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
