//! Application state.

use std::sync::Arc;
use std::time::Duration;

use medigenie_core::GenerativeModel;

use crate::session::SessionStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub model_name: Arc<str>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        model_name: &str,
        session_ttl: Duration,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            sessions: SessionStore::new(model, session_ttl),
            model_name: Arc::from(model_name),
            max_upload_bytes,
        }
    }
}
