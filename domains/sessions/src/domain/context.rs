//! Builds the model context for a chat turn
//!
//! The model sees the stored transcript followed by the new user turn.
//! The first user turn always carries the patient context so the model
//! knows who it is talking to and what the presenting complaint is.

use pulse_llm::{CompletionRequest, LlmMessage, SYSTEM_PROMPT};

use super::entities::{ChatSession, Turn, TurnRole};

/// Header identifying the patient and the presenting complaint
pub fn patient_context(session: &ChatSession) -> String {
    format!(
        "Patient Name: {}\nProblem: {}",
        session.patient_name, session.problem
    )
}

/// Render the opening user turn with the patient context prepended
fn opening_message(session: &ChatSession, content: &str) -> String {
    let header = patient_context(session);
    if content.trim() == session.problem.trim() {
        header
    } else {
        format!("{}\nAdditional Information: {}", header, content)
    }
}

/// Build the completion request for `new_message` appended to `transcript`
pub fn build_completion_request(
    session: &ChatSession,
    transcript: &[Turn],
    new_message: &str,
) -> CompletionRequest {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    let mut seen_user = false;

    let history = transcript
        .iter()
        .map(|turn| (turn.role, turn.content.as_str()))
        .chain(std::iter::once((TurnRole::User, new_message)));

    for (role, content) in history {
        match role {
            TurnRole::User if !seen_user => {
                seen_user = true;
                messages.push(LlmMessage::user(opening_message(session, content)));
            }
            TurnRole::User => messages.push(LlmMessage::user(content)),
            TurnRole::Assistant => messages.push(LlmMessage::assistant(content)),
        }
    }

    CompletionRequest {
        model: String::new(),
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
        messages,
        max_tokens: None,
    }
}
