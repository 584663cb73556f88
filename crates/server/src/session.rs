//! In-memory conversation session store.
//!
//! The orchestrator holds no state of its own (`rag_agent::memory` rebuilds
//! conversation memory fresh from the caller-supplied history on every
//! call), so a session only needs to carry that history plus activity
//! bookkeeping for expiry between HTTP requests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rag_core::Turn;

use crate::ServerError;

pub struct Session {
    pub id: String,
    history: RwLock<Vec<Turn>>,
    last_activity: RwLock<Instant>,
}

impl Session {
    fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), history: RwLock::new(Vec::new()), last_activity: RwLock::new(Instant::now()) }
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    pub fn push_turn(&self, turn: Turn) {
        self.history.write().push(turn);
    }

    pub fn history(&self) -> Vec<Turn> {
        self.history.read().clone()
    }

    pub fn turn_count(&self) -> usize {
        self.history.read().len()
    }
}

pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), max_sessions, session_timeout: Duration::from_secs(3600) }
    }

    pub fn create(&self) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            let timeout = self.session_timeout;
            let expired: Vec<String> = sessions.iter().filter(|(_, s)| s.is_expired(timeout)).map(|(id, _)| id.clone()).collect();
            for id in expired {
                sessions.remove(&id);
            }
            if sessions.len() >= self.max_sessions {
                return Err(ServerError::Session("max sessions reached".to_string()));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone()));
        sessions.insert(id, session.clone());
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) {
        self.sessions.write().remove(id);
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_fetch_session() {
        let manager = SessionManager::new(10);
        let session = manager.create().unwrap();
        assert!(manager.get(&session.id).is_some());
    }

    #[test]
    fn history_accumulates_turns() {
        let manager = SessionManager::new(10);
        let session = manager.create().unwrap();
        session.push_turn(Turn::user("hello"));
        session.push_turn(Turn::assistant("hi there"));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.turn_count(), 2);
    }

    #[test]
    fn remove_drops_session() {
        let manager = SessionManager::new(10);
        let session = manager.create().unwrap();
        manager.remove(&session.id);
        assert!(manager.get(&session.id).is_none());
    }

    #[test]
    fn create_fails_past_capacity() {
        let manager = SessionManager::new(1);
        manager.create().unwrap();
        assert!(manager.create().is_err());
    }
}
