//! Sessions domain state

use std::sync::Arc;

use pulse_llm::LlmService;

use crate::repository::ChatSessionRepository;

/// Application state for the Sessions domain
#[derive(Clone)]
pub struct SessionsState {
    pub repo: Arc<dyn ChatSessionRepository>,
    pub llm: Arc<dyn LlmService>,
}

impl SessionsState {
    pub fn new(repo: Arc<dyn ChatSessionRepository>, llm: Arc<dyn LlmService>) -> Self {
        Self { repo, llm }
    }
}
