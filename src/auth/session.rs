//! Admin session tokens.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Ephemeral token membership check for the single admin role.
///
/// The store is owned by the caller and passed into handlers explicitly; the
/// core holds no process-wide session state. No persistence across restarts
/// is promised.
pub trait SessionStore: Send + Sync {
    /// Mint a new session token.
    fn create(&self) -> String;

    /// Whether the token names a live, unexpired session.
    fn is_valid(&self, token: &str) -> bool;

    /// Drop a session. Unknown tokens are ignored.
    fn invalidate(&self, token: &str);
}

/// In-memory session store with a fixed TTL.
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Instant>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }

    fn generate_token() -> String {
        use rand::Rng;
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill(&mut bytes);
        hex::encode(bytes)
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self) -> String {
        let token = Self::generate_token();
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(token.clone(), Instant::now());
        token
    }

    fn is_valid(&self, token: &str) -> bool {
        let expired = {
            let sessions = self.sessions.read().unwrap();
            match sessions.get(token) {
                None => return false,
                Some(created) => created.elapsed() > self.ttl,
            }
        };

        if expired {
            self.sessions.write().unwrap().remove(token);
            return false;
        }
        true
    }

    fn invalidate(&self, token: &str) {
        self.sessions.write().unwrap().remove(token);
    }
}
