//! Postgres session repository

use std::collections::HashMap;

use pulse_common::{Error, Result};
use sqlx::PgPool;
use uuid::Uuid;

use super::ChatSessionRepository;
use crate::domain::entities::{ChatSession, ChatSessionDetail, SessionPatch, Turn};

#[derive(Clone)]
pub struct PgChatSessionRepository {
    pool: PgPool,
}

impl PgChatSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    #[mutants::skip] // Only reachable against a live database
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_turns(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        turns: &[Turn],
    ) -> Result<()> {
        for turn in turns {
            sqlx::query(
                r#"
                INSERT INTO session_turns (id, session_id, role, content, sequence, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(turn.id)
            .bind(turn.session_id)
            .bind(turn.role)
            .bind(&turn.content)
            .bind(turn.sequence)
            .bind(turn.created_at)
            .execute(&mut **tx)
            .await
            .map_err(map_unique_violation)?;
        }
        Ok(())
    }

    async fn transcript(&self, id: Uuid) -> Result<Vec<Turn>> {
        let turns = sqlx::query_as::<_, Turn>(
            r#"
            SELECT id, session_id, role, content, sequence, created_at
            FROM session_turns
            WHERE session_id = $1
            ORDER BY sequence ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(turns)
    }
}

/// Two writers racing on the same session collide on (session_id, sequence)
fn map_unique_violation(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            Error::Conflict("Session was modified concurrently, please retry".to_string())
        }
        other => Error::Database(other),
    }
}

#[async_trait::async_trait]
impl ChatSessionRepository for PgChatSessionRepository {
    async fn create(&self, session: &ChatSession, turns: &[Turn]) -> Result<ChatSession> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, ChatSession>(
            r#"
            INSERT INTO chat_sessions (id, patient_name, problem, pinned, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, patient_name, problem, pinned, created_at, updated_at
            "#,
        )
        .bind(session.id)
        .bind(&session.patient_name)
        .bind(&session.problem)
        .bind(session.pinned)
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_turns(&mut tx, turns).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ChatSessionDetail>> {
        let session = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT id, patient_name, problem, pinned, created_at, updated_at
            FROM chat_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match session {
            Some(session) => {
                let transcript = self.transcript(id).await?;
                Ok(Some(ChatSessionDetail {
                    session,
                    transcript,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64) -> Result<Vec<ChatSessionDetail>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT id, patient_name, problem, pinned, created_at, updated_at
            FROM chat_sessions
            ORDER BY pinned DESC, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();
        let turns = sqlx::query_as::<_, Turn>(
            r#"
            SELECT id, session_id, role, content, sequence, created_at
            FROM session_turns
            WHERE session_id = ANY($1)
            ORDER BY session_id, sequence ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_session: HashMap<Uuid, Vec<Turn>> = HashMap::new();
        for turn in turns {
            by_session.entry(turn.session_id).or_default().push(turn);
        }

        Ok(sessions
            .into_iter()
            .map(|session| ChatSessionDetail {
                transcript: by_session.remove(&session.id).unwrap_or_default(),
                session,
            })
            .collect())
    }

    async fn append_turns(&self, id: Uuid, turns: &[Turn]) -> Result<Option<ChatSession>> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query_as::<_, ChatSession>(
            r#"
            UPDATE chat_sessions SET updated_at = NOW()
            WHERE id = $1
            RETURNING id, patient_name, problem, pinned, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(session) = touched else {
            return Ok(None);
        };

        Self::insert_turns(&mut tx, turns).await?;
        tx.commit().await?;

        Ok(Some(session))
    }

    async fn update(&self, id: Uuid, patch: &SessionPatch) -> Result<Option<ChatSession>> {
        let updated = sqlx::query_as::<_, ChatSession>(
            r#"
            UPDATE chat_sessions SET
                problem = COALESCE($2, problem),
                pinned = COALESCE($3, pinned),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, patient_name, problem, pinned, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.problem.as_deref().map(str::trim))
        .bind(patch.pinned)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn toggle_pin(&self, id: Uuid) -> Result<Option<ChatSession>> {
        let updated = sqlx::query_as::<_, ChatSession>(
            r#"
            UPDATE chat_sessions SET
                pinned = NOT pinned,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, patient_name, problem, pinned, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
