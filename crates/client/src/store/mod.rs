//! Session store contract consumed by the client core

pub mod http;
pub mod mock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClientError;

pub use http::HttpSessionStore;
pub use mock::MockSessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A stored transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

/// A session as listed by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub patient_name: String,
    pub problem: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub transcript: Vec<Turn>,
}

/// Payload of a chat submission.
///
/// A first turn carries `name`/`problem`; a continuation carries only the
/// message and the bound `session_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

/// Store acknowledgement of a submitted turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTurn {
    pub id: Uuid,
    pub ai_response: String,
}

/// Partial update; only supplied fields change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

/// The persistence service behind the chat UI
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Submit a turn, creating the session when `session_id` is absent
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<SessionTurn, ClientError>;

    /// All sessions, pinned first
    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ClientError>;

    async fn update_session(
        &self,
        id: Uuid,
        patch: &SessionPatch,
    ) -> Result<ChatSession, ClientError>;

    /// Flip the pinned flag server-side
    async fn toggle_pin(&self, id: Uuid) -> Result<ChatSession, ClientError>;

    /// Delete a session. Deleting an unknown id succeeds.
    async fn delete_session(&self, id: Uuid) -> Result<(), ClientError>;
}
