//! Chat controller
//!
//! Owns the conversation draft, the session history and the notice shown
//! to the user. Every successful mutation is followed by a history refresh.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::FirstTurnPolicy;
use crate::conversation::{Conversation, SubmitOutcome};
use crate::error::{ClientError, Notice};
use crate::history::HistoryReconciler;
use crate::store::{SessionPatch, SessionStore};

pub struct ChatController {
    store: Arc<dyn SessionStore>,
    conversation: Conversation,
    history: HistoryReconciler,
    notice: Option<Notice>,
    pending_delete: Option<Uuid>,
}

impl ChatController {
    pub fn new(store: Arc<dyn SessionStore>, policy: FirstTurnPolicy) -> Self {
        Self {
            store,
            conversation: Conversation::new(policy),
            history: HistoryReconciler::new(),
            notice: None,
            pending_delete: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Draft editing goes straight to the conversation
    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn history(&self) -> &HistoryReconciler {
        &self.history
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    /// Session awaiting delete confirmation
    pub fn pending_delete(&self) -> Option<Uuid> {
        self.pending_delete
    }

    /// Initial history load
    pub async fn load(&mut self) {
        self.refresh().await;
    }

    async fn refresh(&mut self) {
        self.history.refresh(self.store.as_ref()).await;
    }

    /// Continue a session from the history list
    pub fn select_session(&mut self, id: Uuid) -> Result<(), ClientError> {
        let session = self
            .history
            .find(id)
            .ok_or_else(|| ClientError::validation("session not found"))?;
        self.conversation.select_session(session);
        self.notice = None;
        Ok(())
    }

    pub fn start_new_chat(&mut self) {
        self.conversation.start_new_chat();
        self.notice = None;
    }

    /// Submit the current draft. Failures show as a banner.
    pub async fn submit_turn(&mut self) -> Result<(), ClientError> {
        let (ticket, request) = match self.conversation.begin_submit() {
            Ok(started) => started,
            Err(err) => {
                self.notice = Some(Notice::Banner(err.to_string()));
                return Err(err);
            }
        };

        let result = self.store.create_session(&request).await;
        let stored = result.is_ok();

        let outcome = self.conversation.complete_submit(ticket, result)?;
        if stored {
            self.refresh().await;
        }

        match outcome {
            SubmitOutcome::Delivered => {
                self.notice = None;
                Ok(())
            }
            SubmitOutcome::Failed(err) => {
                tracing::warn!(error = %err, "Chat submission failed");
                self.notice = Some(Notice::Banner(err.to_string()));
                Err(err)
            }
            SubmitOutcome::Stale => Ok(()),
        }
    }

    /// Retitle a session. Blank titles never reach the store.
    pub async fn rename(&mut self, id: Uuid, title: &str) -> Result<(), ClientError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ClientError::validation("title required"));
        }

        let patch = SessionPatch {
            problem: Some(title.to_string()),
            pinned: None,
        };
        match self.store.update_session(id, &patch).await {
            Ok(session) => {
                self.conversation.session_renamed(id, &session.problem);
                self.refresh().await;
                Ok(())
            }
            Err(err) => Err(self.alert(err)),
        }
    }

    /// Flip the pinned flag on the server
    pub async fn toggle_pin(&mut self, id: Uuid) -> Result<(), ClientError> {
        match self.store.toggle_pin(id).await {
            Ok(_) => {
                self.refresh().await;
                Ok(())
            }
            Err(err) => Err(self.alert(err)),
        }
    }

    /// Open the delete confirmation for `id`
    pub fn request_delete(&mut self, id: Uuid) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the session awaiting confirmation, if any
    pub async fn confirm_delete(&mut self) -> Result<(), ClientError> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(());
        };

        match self.store.delete_session(id).await {
            Ok(()) => {
                if self.conversation.session_deleted(id) {
                    tracing::info!(session_id = %id, "Active session deleted, conversation reset");
                }
                self.refresh().await;
                Ok(())
            }
            Err(err) => Err(self.alert(err)),
        }
    }

    fn alert(&mut self, err: ClientError) -> ClientError {
        tracing::warn!(error = %err, "Session update failed");
        self.notice = Some(Notice::Alert(err.to_string()));
        err
    }
}
