//! Pulse AI chat client core
//!
//! Drives a single patient conversation against the session store:
//! - `conversation`: the draft state machine and local transcript
//! - `history`: the refresh-after-write session list
//! - `controller`: rename, pin and delete plus the submit flow
//! - `store`: the session store contract, an HTTP client and a mock

pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod history;
pub mod store;

pub use config::{ClientConfig, FirstTurnPolicy};
pub use controller::ChatController;
pub use conversation::{
    Conversation, ConversationEvent, ConversationState, ConversationStateMachine, LocalTurn,
    SubmitOutcome, TurnStatus, TurnTicket,
};
pub use error::{ClientError, Notice};
pub use history::HistoryReconciler;
pub use store::{
    ChatSession, CreateSessionRequest, HttpSessionStore, MockSessionStore, SessionPatch,
    SessionStore, SessionTurn, Turn, TurnRole,
};
