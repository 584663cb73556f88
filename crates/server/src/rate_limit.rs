//! Fixed-window request rate limiting, keyed by caller identity.
//!
//! One window per key, reset once a minute. `burst` is the number of
//! extra requests tolerated above the steady-state rate within a single
//! window, so a client that's been idle can send a short burst without
//! being throttled immediately.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use rag_config::RateLimitConfig;
use thiserror::Error;

use crate::state::AppState;

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("rate limit exceeded")]
    Exceeded,
}

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config, windows: Mutex::new(HashMap::new()) }
    }

    pub fn check(&self, key: &str) -> Result<(), RateLimitError> {
        if !self.config.enabled {
            return Ok(());
        }

        let mut windows = self.windows.lock();
        let window = windows.entry(key.to_string()).or_insert_with(|| Window { started_at: Instant::now(), count: 0 });

        if window.started_at.elapsed() > Duration::from_secs(60) {
            window.started_at = Instant::now();
            window.count = 0;
        }

        window.count += 1;
        if window.count > self.config.requests_per_minute + self.config.burst {
            return Err(RateLimitError::Exceeded);
        }

        Ok(())
    }
}

/// Keys off the `Authorization` header so authenticated callers each get
/// their own budget; unauthenticated traffic shares a single "anonymous"
/// bucket.
pub async fn rate_limit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    match state.rate_limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(_) => (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_within_budget() {
        let limiter = RateLimiter::new(RateLimitConfig { enabled: true, requests_per_minute: 5, burst: 0 });
        for _ in 0..5 {
            assert!(limiter.check("client-a").is_ok());
        }
    }

    #[test]
    fn rejects_requests_over_budget() {
        let limiter = RateLimiter::new(RateLimitConfig { enabled: true, requests_per_minute: 2, burst: 0 });
        assert!(limiter.check("client-b").is_ok());
        assert!(limiter.check("client-b").is_ok());
        assert!(limiter.check("client-b").is_err());
    }

    #[test]
    fn disabled_limiter_never_rejects() {
        let limiter = RateLimiter::new(RateLimitConfig { enabled: false, requests_per_minute: 1, burst: 0 });
        for _ in 0..10 {
            assert!(limiter.check("client-c").is_ok());
        }
    }
}
