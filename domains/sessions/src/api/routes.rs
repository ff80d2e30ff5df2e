//! Route definitions for Sessions domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{chat, sessions};
use super::middleware::SessionsState;

/// Create chat routes
fn chat_routes() -> Router<SessionsState> {
    Router::new().route("/api/chat", post(chat::chat))
}

/// Create session management routes
fn session_routes() -> Router<SessionsState> {
    Router::new()
        .route("/api/sessions", get(sessions::list_sessions))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_session)
                .patch(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route("/api/sessions/{id}/pin/toggle", post(sessions::toggle_pin))
}

/// Create all Sessions domain API routes
pub fn routes() -> Router<SessionsState> {
    Router::new().merge(chat_routes()).merge(session_routes())
}
