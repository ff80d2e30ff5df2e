//! Client error taxonomy and user-facing notices

use pulse_common::StateError;
use thiserror::Error;

/// Shown when the store fails without saying why
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors surfaced by client operations.
///
/// `Validation` never reaches the network. The other variants are
/// normalized from transport and HTTP failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    /// The store answered with a failure; carries its message when it sent one
    #[error("{0}")]
    Remote(String),

    #[error("The request timed out. Please try again.")]
    Timeout,

    #[error("Could not reach the server. Please check your connection and try again.")]
    Connectivity(String),

    #[error(transparent)]
    State(#[from] StateError),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// How a failure is presented to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Inline, non-blocking (submission failures)
    Banner(String),
    /// Blocking, must be dismissed (rename, pin and delete failures)
    Alert(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Banner(m) | Notice::Alert(m) => m,
        }
    }
}
