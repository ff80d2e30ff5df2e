//! Session management API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use pulse_common::{Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::SessionsState;
use crate::domain::entities::{ChatSession, ChatSessionDetail, SessionPatch, Turn, TurnRole};
use crate::repository::LIST_LIMIT;

/// Request for updating a session (title, pinned)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    #[validate(length(max = 200, message = "Problem must be at most 200 characters"))]
    pub problem: Option<String>,
    pub pinned: Option<bool>,
}

impl From<UpdateSessionRequest> for SessionPatch {
    fn from(req: UpdateSessionRequest) -> Self {
        Self {
            problem: req.problem,
            pinned: req.pinned,
        }
    }
}

/// Transcript entry DTO
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub role: TurnRole,
    pub content: String,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Turn> for TurnResponse {
    fn from(t: Turn) -> Self {
        Self {
            role: t.role,
            content: t.content,
            sequence: t.sequence,
            created_at: t.created_at,
        }
    }
}

/// Session response DTO
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub patient_name: String,
    pub problem: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub transcript: Vec<TurnResponse>,
}

impl SessionResponse {
    fn with_transcript(s: ChatSession, transcript: Vec<Turn>) -> Self {
        Self {
            id: s.id,
            patient_name: s.patient_name,
            problem: s.problem,
            pinned: s.pinned,
            created_at: s.created_at,
            updated_at: s.updated_at,
            transcript: transcript.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ChatSessionDetail> for SessionResponse {
    fn from(d: ChatSessionDetail) -> Self {
        Self::with_transcript(d.session, d.transcript)
    }
}

/// List sessions, pinned first then newest first
pub async fn list_sessions(
    State(state): State<SessionsState>,
) -> Result<Json<Vec<SessionResponse>>> {
    let sessions = state.repo.list(LIST_LIMIT).await?;
    tracing::debug!(count = sessions.len(), "Listed chat sessions");

    let responses: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(responses))
}

/// Get a single session with its transcript
pub async fn get_session(
    State(state): State<SessionsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let detail = state
        .repo
        .find(id)
        .await?
        .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;

    Ok(Json(detail.into()))
}

/// Update a session (title, pinned)
pub async fn update_session(
    State(state): State<SessionsState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateSessionRequest>,
) -> Result<Json<SessionResponse>> {
    let patch = SessionPatch::from(req);
    patch.validate()?;

    let updated = state
        .repo
        .update(id, &patch)
        .await?
        .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;

    tracing::info!(session_id = %id, "Updated chat session");
    respond_with_transcript(&state, updated).await
}

/// Flip the pinned flag
pub async fn toggle_pin(
    State(state): State<SessionsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let updated = state
        .repo
        .toggle_pin(id)
        .await?
        .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;

    tracing::info!(session_id = %id, pinned = updated.pinned, "Toggled session pin");
    respond_with_transcript(&state, updated).await
}

/// Delete a session and its transcript
pub async fn delete_session(
    State(state): State<SessionsState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.repo.delete(id).await? {
        return Err(Error::NotFound("Session not found".to_string()));
    }

    tracing::info!(session_id = %id, "Deleted chat session");
    Ok(StatusCode::NO_CONTENT)
}

async fn respond_with_transcript(
    state: &SessionsState,
    session: ChatSession,
) -> Result<Json<SessionResponse>> {
    let transcript = state
        .repo
        .find(session.id)
        .await?
        .map(|d| d.transcript)
        .unwrap_or_default();

    Ok(Json(SessionResponse::with_transcript(session, transcript)))
}
