//! Sessions domain: patient chat sessions, transcripts and the chat endpoint

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{ChatSession, ChatSessionDetail, SessionPatch, Turn, TurnRole};

// Re-export repository types
pub use repository::{
    ChatSessionRepository, ChatSessionRepositoryFactory, InMemoryChatSessionRepository,
    PgChatSessionRepository,
};

// Re-export API types
pub use api::routes;
pub use api::SessionsState;
