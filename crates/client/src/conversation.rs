//! Conversation state machine
//!
//! One `Conversation` is the local draft for the chat on screen. It
//! decides which payload a submission sends, keeps the optimistic local
//! transcript and tells stale store responses apart from current ones.
//!
//! States: Uninitialized → AwaitingFirstTurn → ActiveSession. Selecting a
//! stored session jumps straight to ActiveSession; starting a new chat or
//! deleting the active session resets to Uninitialized.

pub use pulse_common::StateError;
use uuid::Uuid;

use crate::config::FirstTurnPolicy;
use crate::error::ClientError;
use crate::store::{ChatSession, CreateSessionRequest, SessionTurn, TurnRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationState {
    /// No session selected, draft empty
    Uninitialized,
    /// Draft has input, nothing submitted yet
    AwaitingFirstTurn,
    /// At least one turn exchanged, session id bound
    ActiveSession,
}

impl ConversationState {
    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [ConversationState] {
        match self {
            Self::Uninitialized => &[
                Self::Uninitialized,
                Self::AwaitingFirstTurn,
                Self::ActiveSession,
            ],
            Self::AwaitingFirstTurn => &[
                Self::Uninitialized,
                Self::AwaitingFirstTurn,
                Self::ActiveSession,
            ],
            Self::ActiveSession => &[Self::Uninitialized, Self::ActiveSession],
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::AwaitingFirstTurn => write!(f, "awaiting_first_turn"),
            Self::ActiveSession => write!(f, "active_session"),
        }
    }
}

/// Events that trigger conversation state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConversationEvent {
    /// A stored session was picked from history
    SelectSession,
    /// The user opened a fresh chat
    StartNewChat,
    /// Draft input became non-empty
    EditDraft,
    /// Draft input was emptied again
    ClearDraft,
    /// The store acknowledged the first submitted turn
    FirstTurnAcknowledged,
    /// The active session was deleted
    SessionDeleted,
}

impl std::fmt::Display for ConversationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectSession => write!(f, "select_session"),
            Self::StartNewChat => write!(f, "start_new_chat"),
            Self::EditDraft => write!(f, "edit_draft"),
            Self::ClearDraft => write!(f, "clear_draft"),
            Self::FirstTurnAcknowledged => write!(f, "first_turn_acknowledged"),
            Self::SessionDeleted => write!(f, "session_deleted"),
        }
    }
}

/// Conversation state machine
pub struct ConversationStateMachine;

impl ConversationStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: ConversationState,
        event: ConversationEvent,
    ) -> Result<ConversationState, StateError> {
        use ConversationEvent as E;
        use ConversationState as S;

        let next = match (current, event) {
            (_, E::SelectSession) => S::ActiveSession,
            (_, E::StartNewChat) | (_, E::SessionDeleted) => S::Uninitialized,
            (S::Uninitialized | S::AwaitingFirstTurn, E::EditDraft) => S::AwaitingFirstTurn,
            (S::Uninitialized | S::AwaitingFirstTurn, E::ClearDraft) => S::Uninitialized,
            (S::Uninitialized | S::AwaitingFirstTurn, E::FirstTurnAcknowledged) => {
                S::ActiveSession
            }
            (S::ActiveSession, E::EditDraft) => S::ActiveSession,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}

/// Not-yet-submitted form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftInputs {
    pub name: String,
    pub problem: String,
    pub message: String,
}

impl DraftInputs {
    fn is_empty(&self) -> bool {
        [&self.name, &self.problem, &self.message]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// Shown optimistically, store has not answered
    Pending,
    Delivered,
    /// The store call failed; the text stays visible
    Failed,
}

/// A transcript entry as shown locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTurn {
    pub role: TurnRole,
    pub content: String,
    pub status: TurnStatus,
}

impl LocalTurn {
    fn delivered(role: TurnRole, content: String) -> Self {
        Self {
            role,
            content,
            status: TurnStatus::Delivered,
        }
    }
}

/// Identifies the draft a submission belongs to.
///
/// Any navigation bumps the conversation's generation, so a response
/// carrying an older ticket is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTicket {
    generation: u64,
    session_id: Option<Uuid>,
    turn_index: usize,
}

impl TurnTicket {
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }
}

/// What became of a completed submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Delivered,
    Failed(ClientError),
    /// The draft moved on; nothing was applied
    Stale,
}

/// The submission awaiting a store answer
#[derive(Debug, Clone)]
struct InFlight {
    ticket: TurnTicket,
    /// Trimmed message as sent
    message: String,
    /// Patient name and title sent with a first turn
    identity: Option<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    state: ConversationState,
    policy: FirstTurnPolicy,
    inputs: DraftInputs,
    session_id: Option<Uuid>,
    patient_name: Option<String>,
    problem: Option<String>,
    transcript: Vec<LocalTurn>,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl Conversation {
    pub fn new(policy: FirstTurnPolicy) -> Self {
        Self {
            state: ConversationState::Uninitialized,
            policy,
            inputs: DraftInputs::default(),
            session_id: None,
            patient_name: None,
            problem: None,
            transcript: Vec::new(),
            generation: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn inputs(&self) -> &DraftInputs {
        &self.inputs
    }

    pub fn transcript(&self) -> &[LocalTurn] {
        &self.transcript
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.patient_name.as_deref()
    }

    /// Title of the active session
    pub fn problem(&self) -> Option<&str> {
        self.problem.as_deref()
    }

    /// A submission is outstanding; the submit control is disabled
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn apply(&mut self, event: ConversationEvent) -> Result<(), StateError> {
        let next = ConversationStateMachine::transition(self.state, event)?;
        tracing::debug!(from = %self.state, to = %next, event = %event, "Conversation transition");
        self.state = next;
        Ok(())
    }

    /// Apply an event that no state rejects
    fn apply_total(&mut self, event: ConversationEvent) {
        if let Err(err) = self.apply(event) {
            tracing::warn!(error = %err, "Ignoring conversation event");
        }
    }

    /// Drop everything tied to the current draft
    fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.inputs = DraftInputs::default();
        self.session_id = None;
        self.patient_name = None;
        self.problem = None;
        self.transcript.clear();
    }

    /// Load a stored session and continue it
    pub fn select_session(&mut self, session: &ChatSession) {
        self.reset();
        self.apply_total(ConversationEvent::SelectSession);
        self.session_id = Some(session.id);
        self.patient_name = Some(session.patient_name.clone());
        self.problem = Some(session.problem.clone());
        self.transcript = session
            .transcript
            .iter()
            .map(|t| LocalTurn::delivered(t.role, t.content.clone()))
            .collect();
    }

    /// Discard the draft unconditionally
    pub fn start_new_chat(&mut self) {
        self.reset();
        self.apply_total(ConversationEvent::StartNewChat);
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.inputs.name = name.into();
        self.after_edit();
    }

    pub fn set_problem(&mut self, problem: impl Into<String>) {
        self.inputs.problem = problem.into();
        self.after_edit();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.inputs.message = message.into();
        self.after_edit();
    }

    fn after_edit(&mut self) {
        if self.state == ConversationState::ActiveSession {
            return;
        }
        let event = if self.inputs.is_empty() {
            ConversationEvent::ClearDraft
        } else {
            ConversationEvent::EditDraft
        };
        self.apply_total(event);
    }

    /// Validate the draft, append the user turn optimistically and build
    /// the store request. Validation failures leave everything unchanged.
    pub fn begin_submit(&mut self) -> Result<(TurnTicket, CreateSessionRequest), ClientError> {
        if self.is_loading() {
            return Err(ClientError::validation("reply still pending"));
        }

        let message = self.inputs.message.trim().to_string();
        let (request, shown, identity) = match self.state {
            ConversationState::ActiveSession => {
                if message.is_empty() {
                    return Err(ClientError::validation("message required"));
                }
                let request = CreateSessionRequest {
                    name: None,
                    problem: None,
                    message: message.clone(),
                    session_id: self.session_id,
                };
                (request, message, None)
            }
            ConversationState::Uninitialized | ConversationState::AwaitingFirstTurn => {
                let name = self.inputs.name.trim();
                let problem = self.inputs.problem.trim();
                if name.is_empty() {
                    return Err(ClientError::validation("name required"));
                }
                match self.policy {
                    FirstTurnPolicy::RequireProblem if problem.is_empty() => {
                        return Err(ClientError::validation("problem required"));
                    }
                    FirstTurnPolicy::RequireMessage if message.is_empty() => {
                        return Err(ClientError::validation("message required"));
                    }
                    _ => {}
                }

                let shown = if message.is_empty() {
                    problem.to_string()
                } else {
                    message.clone()
                };
                let title = if problem.is_empty() {
                    shown.clone()
                } else {
                    problem.to_string()
                };
                let identity = Some((name.to_string(), title));
                let request = CreateSessionRequest {
                    name: Some(name.to_string()),
                    problem: (!problem.is_empty()).then(|| problem.to_string()),
                    message,
                    session_id: None,
                };
                (request, shown, identity)
            }
        };

        self.transcript.push(LocalTurn {
            role: TurnRole::User,
            content: shown,
            status: TurnStatus::Pending,
        });
        self.inputs.message.clear();

        let ticket = TurnTicket {
            generation: self.generation,
            session_id: self.session_id,
            turn_index: self.transcript.len() - 1,
        };
        self.in_flight = Some(InFlight {
            ticket,
            message: request.message.clone(),
            identity,
        });

        Ok((ticket, request))
    }

    /// Apply the store's answer to a submission started by `begin_submit`
    pub fn complete_submit(
        &mut self,
        ticket: TurnTicket,
        result: Result<SessionTurn, ClientError>,
    ) -> Result<SubmitOutcome, ClientError> {
        if ticket.generation != self.generation || self.session_id != ticket.session_id {
            tracing::debug!(
                ticket_session = ?ticket.session_id,
                current_session = ?self.session_id,
                "Discarding stale chat response"
            );
            return Ok(SubmitOutcome::Stale);
        }

        let sent = self.in_flight.take().filter(|f| f.ticket == ticket);

        let turn = match result {
            Ok(turn) => turn,
            Err(err) => {
                if let Some(local) = self.transcript.get_mut(ticket.turn_index) {
                    local.status = TurnStatus::Failed;
                }
                // Give the text back for a retry unless something new was typed
                if let Some(sent) = sent {
                    if self.inputs.message.trim().is_empty() {
                        self.inputs.message = sent.message;
                    }
                }
                return Ok(SubmitOutcome::Failed(err));
            }
        };

        if let Some(local) = self.transcript.get_mut(ticket.turn_index) {
            local.status = TurnStatus::Delivered;
        }
        self.transcript
            .push(LocalTurn::delivered(TurnRole::Assistant, turn.ai_response));

        if self.state != ConversationState::ActiveSession {
            self.apply(ConversationEvent::FirstTurnAcknowledged)?;
            self.session_id = Some(turn.id);
            if let Some((name, title)) = sent.and_then(|s| s.identity) {
                self.patient_name = Some(name);
                self.problem = Some(title);
            }
            self.inputs.name.clear();
            self.inputs.problem.clear();
        }

        Ok(SubmitOutcome::Delivered)
    }

    /// React to a deletion; resets when it hit the active session
    pub fn session_deleted(&mut self, id: Uuid) -> bool {
        if self.session_id != Some(id) {
            return false;
        }
        self.reset();
        self.apply_total(ConversationEvent::SessionDeleted);
        true
    }

    /// Keep the local title in step with a rename
    pub fn session_renamed(&mut self, id: Uuid, title: &str) {
        if self.session_id == Some(id) {
            self.problem = Some(title.to_string());
        }
    }
}
