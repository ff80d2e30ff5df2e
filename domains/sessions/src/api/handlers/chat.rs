//! Chat turn handler
//!
//! One endpoint serves both the first turn of a new session and every
//! continuation. The user turn and the assistant reply are persisted
//! together only after the model answers, so a failed completion leaves
//! the store untouched.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use pulse_common::{Error, Result, ValidatedJson};
use pulse_llm::{clean_markdown_formatting, CompletionRequest, LlmError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::SessionsState;
use crate::domain::context::build_completion_request;
use crate::domain::entities::{ChatSession, Turn};

/// Message shown to the patient when the model call fails
const GENERATION_FAILED: &str = "Failed to generate AI response. Please try again.";

/// Request for a chat turn
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    /// Patient name, used only when starting a session
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    /// Presenting problem, used only when starting a session
    #[validate(length(max = 200, message = "Problem must be at most 200 characters"))]
    pub problem: Option<String>,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,

    /// Existing session to continue
    pub session_id: Option<Uuid>,
}

/// Response for a chat turn
#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub id: Uuid,
    pub patient_name: String,
    pub problem: String,
    pub ai_response: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatTurnResponse {
    fn new(session: ChatSession, ai_response: String) -> Self {
        Self {
            id: session.id,
            patient_name: session.patient_name,
            problem: session.problem,
            ai_response,
            pinned: session.pinned,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Submit a chat turn, starting a new session when no `session_id` is given
pub async fn chat(
    State(state): State<SessionsState>,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatTurnResponse>> {
    let response = match req.session_id {
        Some(id) => continue_session(&state, id, req.message.as_deref()).await?,
        None => {
            start_session(
                &state,
                req.name.as_deref(),
                req.problem.as_deref(),
                req.message.as_deref(),
            )
            .await?
        }
    };

    Ok(Json(response))
}

async fn start_session(
    state: &SessionsState,
    name: Option<&str>,
    problem: Option<&str>,
    message: Option<&str>,
) -> Result<ChatTurnResponse> {
    let session = ChatSession::new(name, problem, message)?;
    let content = ChatSession::opening_turn_content(problem, message).ok_or_else(|| {
        Error::Validation("Either a problem or a message is required".to_string())
    })?;

    let request = build_completion_request(&session, &[], &content);
    let reply = generate_reply(state, request).await?;

    let turns = [
        Turn::new_user(session.id, content, 1)?,
        Turn::new_assistant(session.id, reply.clone(), 2)?,
    ];
    let created = state.repo.create(&session, &turns).await?;

    tracing::info!(session_id = %created.id, "Started chat session");
    Ok(ChatTurnResponse::new(created, reply))
}

async fn continue_session(
    state: &SessionsState,
    id: Uuid,
    message: Option<&str>,
) -> Result<ChatTurnResponse> {
    let detail = state
        .repo
        .find(id)
        .await?
        .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;

    let content = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::Validation("Message is required".to_string()))?
        .to_string();

    let request = build_completion_request(&detail.session, &detail.transcript, &content);
    let reply = generate_reply(state, request).await?;

    let sequence = detail.next_sequence();
    let turns = [
        Turn::new_user(id, content, sequence)?,
        Turn::new_assistant(id, reply.clone(), sequence + 1)?,
    ];
    let session = state
        .repo
        .append_turns(id, &turns)
        .await?
        .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;

    tracing::debug!(session_id = %id, sequence, "Continued chat session");
    Ok(ChatTurnResponse::new(session, reply))
}

async fn generate_reply(state: &SessionsState, request: CompletionRequest) -> Result<String> {
    let response = state.llm.complete(request).await.map_err(|e| {
        tracing::error!(error = %e, "AI completion failed");
        llm_error(e)
    })?;

    Ok(clean_markdown_formatting(&response.content))
}

fn llm_error(err: LlmError) -> Error {
    match err {
        LlmError::Timeout => Error::Timeout(err.to_string()),
        LlmError::RateLimit => Error::RateLimit(
            "AI service is busy right now. Please try again shortly.".to_string(),
        ),
        _ => Error::Upstream(GENERATION_FAILED.to_string()),
    }
}
