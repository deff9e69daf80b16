//! Per-visitor session store.
//!
//! Every browser gets its own `SubmissionHandler` (and therefore its own
//! conversation history), keyed by a random cookie. Handlers are never shared
//! between cookies. Each handler sits behind its own async mutex so a single
//! visitor's submissions are processed one at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use medigenie_core::{GenerativeModel, SubmissionHandler};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "medigenie_session";

/// Shared handle to one visitor's handler.
pub type SessionHandle = Arc<Mutex<SubmissionHandler>>;

struct Entry {
    handler: SessionHandle,
    last_seen: DateTime<Utc>,
}

/// Session table with idle expiry.
#[derive(Clone)]
pub struct SessionStore {
    model: Arc<dyn GenerativeModel>,
    ttl: Duration,
    sessions: Arc<std::sync::Mutex<HashMap<Uuid, Entry>>>,
}

impl SessionStore {
    pub fn new(model: Arc<dyn GenerativeModel>, ttl: Duration) -> Self {
        Self {
            model,
            ttl,
            sessions: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Look up the caller's session, creating one if the id is unknown.
    ///
    /// Returns the session id (new or existing) and its handler.
    pub fn acquire(&self, id: Option<Uuid>) -> (Uuid, SessionHandle) {
        let now = Utc::now();
        let mut sessions = self.lock();
        self.evict_idle(&mut sessions, now);

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, entry.handler.clone());
            }
        }

        let id = Uuid::new_v4();
        let handler = Arc::new(Mutex::new(SubmissionHandler::new(self.model.clone())));
        sessions.insert(
            id,
            Entry {
                handler: handler.clone(),
                last_seen: now,
            },
        );
        info!(session = %id, active = sessions.len(), "Session started");
        (id, handler)
    }

    /// Existing session only; never creates one.
    pub fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Utc::now();
        Some(entry.handler.clone())
    }

    /// Tear a session down. Returns whether it existed.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            info!(session = %id, "Session ended");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Entry>, now: DateTime<Utc>) {
        let Ok(ttl) = chrono::Duration::from_std(self.ttl) else {
            return;
        };
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
        // A panic while holding the table lock leaves the map itself intact
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read the session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value for a session id.
pub fn session_cookie(id: Uuid) -> HeaderValue {
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    // Only ASCII: cookie name, hyphenated uuid and attributes
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medigenie_core::chat::Content;
    use medigenie_core::ServiceError;

    struct Silent;

    #[async_trait]
    impl GenerativeModel for Silent {
        async fn generate(&self, _contents: &[Content]) -> Result<String, ServiceError> {
            Ok(String::new())
        }
    }

    fn store(ttl: Duration) -> SessionStore {
        SessionStore::new(Arc::new(Silent), ttl)
    }

    #[test]
    fn test_acquire_reuses_known_id() {
        let store = store(Duration::from_secs(60));
        let (id, first) = store.acquire(None);
        let (same, second) = store.acquire(Some(id));
        assert_eq!(id, same);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_id_gets_fresh_session() {
        let store = store(Duration::from_secs(60));
        let stranger = Uuid::new_v4();
        let (id, _) = store.acquire(Some(stranger));
        assert_ne!(id, stranger);
        assert!(store.get(stranger).is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = store(Duration::from_secs(60));
        let (a, handler_a) = store.acquire(None);
        let (b, handler_b) = store.acquire(None);
        assert_ne!(a, b);
        assert!(!Arc::ptr_eq(&handler_a, &handler_b));
    }

    #[test]
    fn test_zero_ttl_evicts_on_next_acquire() {
        let store = store(Duration::ZERO);
        let (id, _) = store.acquire(None);
        std::thread::sleep(Duration::from_millis(5));
        let (next, _) = store.acquire(Some(id));
        assert_ne!(id, next);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = store(Duration::from_secs(60));
        let (id, _) = store.acquire(None);
        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; other=1")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));

        let mut bad = HeaderMap::new();
        bad.insert(header::COOKIE, HeaderValue::from_static("medigenie_session=not-a-uuid"));
        assert_eq!(session_id(&bad), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = Uuid::new_v4();
        let value = session_cookie(id);
        let text = value.to_str().unwrap();
        assert!(text.starts_with(&format!("{SESSION_COOKIE}={id}")));
        assert!(text.contains("HttpOnly"));
    }
}
