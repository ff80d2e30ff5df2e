//! Repository implementations for the Sessions domain

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use pulse_common::{Config, Result, SessionStoreProvider};
use uuid::Uuid;

use crate::domain::entities::{ChatSession, ChatSessionDetail, SessionPatch, Turn};

pub use memory::InMemoryChatSessionRepository;
pub use postgres::PgChatSessionRepository;

/// Maximum number of sessions returned by a listing
pub const LIST_LIMIT: i64 = 100;

/// Persistence for chat sessions and their transcripts.
///
/// Listings are ordered pinned first, then newest first. Transcripts are
/// append-only and ordered by sequence.
#[async_trait::async_trait]
pub trait ChatSessionRepository: Send + Sync {
    /// Insert a session together with its opening turns, atomically
    async fn create(&self, session: &ChatSession, turns: &[Turn]) -> Result<ChatSession>;

    /// Find a session with its transcript
    async fn find(&self, id: Uuid) -> Result<Option<ChatSessionDetail>>;

    /// List sessions, pinned first, then by `created_at` descending
    async fn list(&self, limit: i64) -> Result<Vec<ChatSessionDetail>>;

    /// Append turns to an existing session, atomically. `None` if the
    /// session does not exist; `Error::Conflict` if a sequence is taken.
    async fn append_turns(&self, id: Uuid, turns: &[Turn]) -> Result<Option<ChatSession>>;

    /// Merge a partial update
    async fn update(&self, id: Uuid, patch: &SessionPatch) -> Result<Option<ChatSession>>;

    /// Flip the pinned flag from its stored value
    async fn toggle_pin(&self, id: Uuid) -> Result<Option<ChatSession>>;

    /// Delete a session and its transcript
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Factory for creating the configured repository
pub struct ChatSessionRepositoryFactory;

impl ChatSessionRepositoryFactory {
    /// Create a repository based on configuration. The postgres store
    /// connects and runs migrations before returning.
    pub async fn create(config: &Config) -> anyhow::Result<Arc<dyn ChatSessionRepository>> {
        match config.session_store {
            SessionStoreProvider::Postgres => {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL is required for the postgres session store")
                })?;
                tracing::info!("Creating postgres session repository");
                let pool = sqlx::PgPool::connect(url)
                    .await
                    .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
                sqlx::migrate!("../../migrations").run(&pool).await?;
                Ok(Arc::new(PgChatSessionRepository::new(pool)))
            }
            SessionStoreProvider::Memory => {
                tracing::info!("Creating in-memory session repository");
                Ok(Arc::new(InMemoryChatSessionRepository::new()))
            }
        }
    }
}
