//! Domain entities for the Sessions domain
//!
//! A chat session is one persisted patient conversation. Its transcript is
//! an append-only list of turns ordered by `sequence`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pulse_common::{Error, Result};

/// Name stored when the patient does not give one
pub const ANONYMOUS_PATIENT: &str = "Anonymous";

/// Maximum patient name length
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum problem (session title) length
pub const MAX_PROBLEM_LENGTH: usize = 200;

/// Maximum length of a single patient message
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Turn role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "turn_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat session entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatSession {
    pub id: Uuid,
    pub patient_name: String,
    pub problem: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a new session from the first submission.
    ///
    /// The name falls back to [`ANONYMOUS_PATIENT`]. The problem becomes the
    /// title; without one the title is taken from the opening message.
    pub fn new(name: Option<&str>, problem: Option<&str>, message: Option<&str>) -> Result<Self> {
        let patient_name = non_blank(name)
            .map(str::to_string)
            .unwrap_or_else(|| ANONYMOUS_PATIENT.to_string());

        if patient_name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        let problem = match (non_blank(problem), non_blank(message)) {
            (Some(p), _) => {
                if p.chars().count() > MAX_PROBLEM_LENGTH {
                    return Err(Error::Validation(format!(
                        "Problem must be at most {} characters",
                        MAX_PROBLEM_LENGTH
                    )));
                }
                p.to_string()
            }
            (None, Some(m)) => m.chars().take(MAX_PROBLEM_LENGTH).collect(),
            (None, None) => {
                return Err(Error::Validation(
                    "Either a problem or a message is required".to_string(),
                ))
            }
        };

        let now = Utc::now();
        Ok(ChatSession {
            id: Uuid::new_v4(),
            patient_name,
            problem,
            pinned: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Content of the opening user turn: the message, or the problem when
    /// the patient only described the problem.
    pub fn opening_turn_content(problem: Option<&str>, message: Option<&str>) -> Option<String> {
        non_blank(message)
            .or_else(|| non_blank(problem))
            .map(str::to_string)
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(ref problem) = patch.problem {
            self.problem = problem.trim().to_string();
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update of a session: only supplied fields change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    pub problem: Option<String>,
    pub pinned: Option<bool>,
}

impl SessionPatch {
    /// Reject empty patches and blank titles
    pub fn validate(&self) -> Result<()> {
        if self.problem.is_none() && self.pinned.is_none() {
            return Err(Error::Validation("No valid updates provided".to_string()));
        }
        if let Some(ref problem) = self.problem {
            if problem.trim().is_empty() {
                return Err(Error::Validation(
                    "Problem cannot be empty or whitespace-only".to_string(),
                ));
            }
            if problem.trim().chars().count() > MAX_PROBLEM_LENGTH {
                return Err(Error::Validation(format!(
                    "Problem must be at most {} characters",
                    MAX_PROBLEM_LENGTH
                )));
            }
        }
        Ok(())
    }
}

/// One message exchange unit in a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Turn {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: TurnRole,
    pub content: String,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn
    pub fn new_user(session_id: Uuid, content: String, sequence: i32) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty or whitespace-only".to_string(),
            ));
        }
        Self::build(session_id, TurnRole::User, content, sequence)
    }

    /// Create a new assistant turn. Empty content is kept as-is.
    pub fn new_assistant(session_id: Uuid, content: String, sequence: i32) -> Result<Self> {
        Self::build(session_id, TurnRole::Assistant, content, sequence)
    }

    fn build(session_id: Uuid, role: TurnRole, content: String, sequence: i32) -> Result<Self> {
        if sequence < 1 {
            return Err(Error::Validation(
                "Turn sequence must be at least 1".to_string(),
            ));
        }
        Ok(Turn {
            id: Uuid::new_v4(),
            session_id,
            role,
            content,
            sequence,
            created_at: Utc::now(),
        })
    }
}

/// A session together with its ordered transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSessionDetail {
    pub session: ChatSession,
    pub transcript: Vec<Turn>,
}

impl ChatSessionDetail {
    /// Sequence number the next appended turn must carry
    pub fn next_sequence(&self) -> i32 {
        self.transcript.last().map(|t| t.sequence).unwrap_or(0) + 1
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
