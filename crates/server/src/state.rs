//! Shared application state handed to every HTTP handler.

use std::sync::Arc;

use parking_lot::RwLock;
use rag_agent::AgenticOrchestrator;
use rag_config::Settings;
use rag_core::Retriever;

use crate::rate_limit::RateLimiter;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<RwLock<Settings>>,
    pub orchestrator: Arc<AgenticOrchestrator>,
    pub retriever: Arc<dyn Retriever>,
    pub sessions: Arc<SessionManager>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(settings: Settings, orchestrator: Arc<AgenticOrchestrator>, retriever: Arc<dyn Retriever>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(settings.rate_limit.clone()));
        Self {
            settings: Arc::new(RwLock::new(settings)),
            orchestrator,
            retriever,
            sessions: Arc::new(SessionManager::new(1000)),
            rate_limiter,
        }
    }
}
