use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::gateway::models::{CartLine, User};

/// Per-client server-side state: authentication plus the cart cache.
///
/// `cart_items` and `cart_id` must not be trusted once the cache is older
/// than the TTL (see `cart::is_stale`); the cart module refreshes them from
/// the gateway before use. A `cart_timestamp` of 0 means never refreshed.
#[derive(Debug, Default)]
pub struct Session {
    pub auth_token: Option<String>,
    pub current_user: Option<User>,
    pub cart_id: Option<u64>,
    pub cart_items: Vec<CartLine>,
    pub cart_timestamp: i64,
}

/// A session behind its own async lock. Concurrent requests bearing the same
/// session id serialize their cache read-modify-write sequences here.
pub type SharedSession = Arc<AsyncMutex<Session>>;

/// Maps opaque session ids to sessions. One store per server process,
/// injected into the router state.
///
/// Sessions are created lazily on first sight of an id and never destroyed;
/// they live for the process lifetime. That growth is an accepted tradeoff
/// of the design, not something this store tries to paper over.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, SharedSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh opaque session id.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn get(&self, session_id: &str) -> Option<SharedSession> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(session_id).cloned()
    }

    /// Look up a session, creating it if the id is unknown. Lookup and
    /// creation happen under one lock so two concurrent first-requests for
    /// the same id land on the same session.
    pub fn get_or_create(&self, session_id: &str) -> (SharedSession, bool) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(existing) = sessions.get(session_id) {
            return (existing.clone(), false);
        }
        let session: SharedSession = Arc::new(AsyncMutex::new(Session::default()));
        sessions.insert(session_id.to_string(), session.clone());
        (session, true)
    }

    /// Drop all sessions. For tests and resets.
    pub fn clear(&self) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.clear();
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap();
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
