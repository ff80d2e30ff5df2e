//! In-memory session repository
//!
//! Used for local development and tests. Thread-safe via `Arc<RwLock<>>`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use pulse_common::{Error, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ChatSessionRepository;
use crate::domain::entities::{ChatSession, ChatSessionDetail, SessionPatch, Turn};

#[derive(Debug, Clone, Default)]
pub struct InMemoryChatSessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, ChatSessionDetail>>>,
}

impl InMemoryChatSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Turns must continue the transcript without gaps or reuse
fn check_sequences(detail: &ChatSessionDetail, turns: &[Turn]) -> Result<()> {
    let mut expected = detail.next_sequence();
    for turn in turns {
        if turn.sequence != expected {
            return Err(Error::Conflict(
                "Session was modified concurrently, please retry".to_string(),
            ));
        }
        expected += 1;
    }
    Ok(())
}

#[async_trait::async_trait]
impl ChatSessionRepository for InMemoryChatSessionRepository {
    async fn create(&self, session: &ChatSession, turns: &[Turn]) -> Result<ChatSession> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(Error::Conflict("Session already exists".to_string()));
        }

        let detail = ChatSessionDetail {
            session: session.clone(),
            transcript: Vec::new(),
        };
        check_sequences(&detail, turns)?;

        sessions.insert(
            session.id,
            ChatSessionDetail {
                transcript: turns.to_vec(),
                ..detail
            },
        );
        Ok(session.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ChatSessionDetail>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn list(&self, limit: i64) -> Result<Vec<ChatSessionDetail>> {
        let sessions = self.sessions.read().await;
        let mut all: Vec<ChatSessionDetail> = sessions.values().cloned().collect();
        all.sort_by(|a, b| {
            b.session
                .pinned
                .cmp(&a.session.pinned)
                .then(b.session.created_at.cmp(&a.session.created_at))
        });
        all.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(all)
    }

    async fn append_turns(&self, id: Uuid, turns: &[Turn]) -> Result<Option<ChatSession>> {
        let mut sessions = self.sessions.write().await;
        let Some(detail) = sessions.get_mut(&id) else {
            return Ok(None);
        };

        check_sequences(detail, turns)?;
        detail.transcript.extend_from_slice(turns);
        detail.session.updated_at = Utc::now();
        Ok(Some(detail.session.clone()))
    }

    async fn update(&self, id: Uuid, patch: &SessionPatch) -> Result<Option<ChatSession>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(&id).map(|detail| {
            detail.session.apply(patch);
            detail.session.clone()
        }))
    }

    async fn toggle_pin(&self, id: Uuid) -> Result<Option<ChatSession>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(&id).map(|detail| {
            let patch = SessionPatch {
                problem: None,
                pinned: Some(!detail.session.pinned),
            };
            detail.session.apply(&patch);
            detail.session.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }
}
