//! Shared utilities, configuration, and error handling for Pulse AI
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - State machine errors shared by every state machine
//! - Request extractors

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, SessionStoreProvider};
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
pub use state::StateError;
