//! Session history
//!
//! Refresh-after-write: the cached list is replaced wholesale with
//! whatever the store returns. Nothing is merged or synthesized locally
//! and the store's ordering (pinned first) is kept as-is.

use uuid::Uuid;

use crate::store::{ChatSession, SessionStore};

#[derive(Debug, Clone, Default)]
pub struct HistoryReconciler {
    sessions: Vec<ChatSession>,
}

impl HistoryReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn find(&self, id: Uuid) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Re-fetch the full list. A failed fetch empties the cache rather
    /// than leave possibly-deleted sessions on screen.
    pub async fn refresh(&mut self, store: &dyn SessionStore) -> &[ChatSession] {
        match store.list_sessions().await {
            Ok(sessions) => {
                tracing::debug!(count = sessions.len(), "Refreshed session history");
                self.sessions = sessions;
            }
            Err(err) => {
                tracing::warn!(error = %err, "History refresh failed, clearing cached sessions");
                self.sessions.clear();
            }
        }
        &self.sessions
    }
}
