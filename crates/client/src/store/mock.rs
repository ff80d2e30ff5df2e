//! In-memory session store
//!
//! Mirrors the server's ordering and merge semantics, records every call
//! and can be told to fail the next call of a given operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use super::{
    ChatSession, CreateSessionRequest, SessionPatch, SessionStore, SessionTurn, Turn, TurnRole,
};
use crate::error::ClientError;

/// Store operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    List,
    Update,
    TogglePin,
    Delete,
}

/// A recorded store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create(CreateSessionRequest),
    List,
    Update(Uuid, SessionPatch),
    TogglePin(Uuid),
    Delete(Uuid),
}

impl StoreCall {
    pub fn operation(&self) -> Operation {
        match self {
            StoreCall::Create(_) => Operation::Create,
            StoreCall::List => Operation::List,
            StoreCall::Update(..) => Operation::Update,
            StoreCall::TogglePin(_) => Operation::TogglePin,
            StoreCall::Delete(_) => Operation::Delete,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    sessions: Vec<ChatSession>,
    calls: Vec<StoreCall>,
    failures: HashMap<Operation, ClientError>,
    reply: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    inner: Arc<Mutex<Inner>>,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next call of `operation` with `error`
    pub fn fail_next(&self, operation: Operation, error: ClientError) {
        self.lock().failures.insert(operation, error);
    }

    /// Use `reply` as the assistant text for every following turn
    pub fn set_reply(&self, reply: impl Into<String>) {
        self.lock().reply = Some(reply.into());
    }

    /// Seed a session directly, bypassing the call log
    pub fn insert(&self, session: ChatSession) {
        self.lock().sessions.push(session);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls of `operation`
    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn session(&self, id: Uuid) -> Option<ChatSession> {
        self.lock().sessions.iter().find(|s| s.id == id).cloned()
    }

    fn record(&self, call: StoreCall) -> Result<MutexGuard<'_, Inner>, ClientError> {
        let mut inner = self.lock();
        let operation = call.operation();
        inner.calls.push(call);
        match inner.failures.remove(&operation) {
            Some(err) => Err(err),
            None => Ok(inner),
        }
    }
}

fn not_found() -> ClientError {
    ClientError::Remote("Session not found".to_string())
}

fn push_turn(session: &mut ChatSession, role: TurnRole, content: String) {
    session.transcript.push(Turn {
        role,
        content,
        sequence: session.transcript.len() as i32 + 1,
        created_at: Utc::now(),
    });
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait::async_trait]
impl SessionStore for MockSessionStore {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<SessionTurn, ClientError> {
        let mut inner = self.record(StoreCall::Create(request.clone()))?;
        let message = non_blank(Some(&request.message));

        let index = match request.session_id {
            Some(id) => {
                let message = message
                    .ok_or_else(|| ClientError::Remote("Message is required".to_string()))?;
                let index = inner
                    .sessions
                    .iter()
                    .position(|s| s.id == id)
                    .ok_or_else(not_found)?;
                push_turn(&mut inner.sessions[index], TurnRole::User, message.to_string());
                index
            }
            None => {
                let problem = non_blank(request.problem.as_deref());
                let opening = message.or(problem).ok_or_else(|| {
                    ClientError::Remote("Either a problem or a message is required".to_string())
                })?;

                let now = Utc::now();
                let mut session = ChatSession {
                    id: Uuid::new_v4(),
                    patient_name: non_blank(request.name.as_deref())
                        .unwrap_or("Anonymous")
                        .to_string(),
                    problem: problem.unwrap_or(opening).chars().take(200).collect(),
                    pinned: false,
                    created_at: now,
                    updated_at: now,
                    transcript: Vec::new(),
                };
                push_turn(&mut session, TurnRole::User, opening.to_string());
                inner.sessions.push(session);
                inner.sessions.len() - 1
            }
        };

        let ai_response = inner.reply.clone().unwrap_or_else(|| {
            let last = inner.sessions[index]
                .transcript
                .last()
                .map(|t| t.content.clone())
                .unwrap_or_default();
            format!("Reply to: {}", last)
        });

        let session = &mut inner.sessions[index];
        push_turn(session, TurnRole::Assistant, ai_response.clone());
        session.updated_at = Utc::now();

        Ok(SessionTurn {
            id: session.id,
            ai_response,
        })
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ClientError> {
        let inner = self.record(StoreCall::List)?;
        let mut sessions = inner.sessions.clone();
        sessions.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(sessions)
    }

    async fn update_session(
        &self,
        id: Uuid,
        patch: &SessionPatch,
    ) -> Result<ChatSession, ClientError> {
        let mut inner = self.record(StoreCall::Update(id, patch.clone()))?;
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(not_found)?;

        if let Some(ref problem) = patch.problem {
            session.problem = problem.trim().to_string();
        }
        if let Some(pinned) = patch.pinned {
            session.pinned = pinned;
        }
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn toggle_pin(&self, id: Uuid) -> Result<ChatSession, ClientError> {
        let mut inner = self.record(StoreCall::TogglePin(id))?;
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(not_found)?;

        session.pinned = !session.pinned;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), ClientError> {
        let mut inner = self.record(StoreCall::Delete(id))?;
        inner.sessions.retain(|s| s.id != id);
        Ok(())
    }
}
