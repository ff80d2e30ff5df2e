//! Postgres repository integration tests
//!
//! Skipped unless `TEST_DATABASE_URL` points at a disposable database.

use pulse_common::Error;
use pulse_sessions::{
    ChatSession, ChatSessionRepository, PgChatSessionRepository, SessionPatch, Turn,
};

use crate::common::TestConfig;

async fn repository() -> Option<PgChatSessionRepository> {
    let url = TestConfig::from_env().database_url?;
    let pool = sqlx::PgPool::connect(&url).await.ok()?;
    sqlx::migrate!("../../migrations").run(&pool).await.ok()?;
    Some(PgChatSessionRepository::new(pool))
}

async fn seed(repo: &PgChatSessionRepository, problem: &str) -> ChatSession {
    let session = ChatSession::new(Some("Jane"), Some(problem), None).unwrap();
    let turns = [
        Turn::new_user(session.id, problem.to_string(), 1).unwrap(),
        Turn::new_assistant(session.id, "How long?".to_string(), 2).unwrap(),
    ];
    repo.create(&session, &turns).await.unwrap()
}

#[tokio::test]
async fn test_pg_session_lifecycle() {
    let Some(repo) = repository().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let session = seed(&repo, "fever").await;

    let more = [
        Turn::new_user(session.id, "Three days".to_string(), 3).unwrap(),
        Turn::new_assistant(session.id, String::new(), 4).unwrap(),
    ];
    repo.append_turns(session.id, &more).await.unwrap().unwrap();

    let found = repo.find(session.id).await.unwrap().unwrap();
    let sequences: Vec<i32> = found.transcript.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
    assert_eq!(found.transcript[3].content, "");

    let patch = SessionPatch {
        problem: Some("  Flu ".to_string()),
        pinned: None,
    };
    let updated = repo.update(session.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.problem, "Flu");
    assert!(!updated.pinned);

    assert!(repo.toggle_pin(session.id).await.unwrap().unwrap().pinned);

    assert!(repo.delete(session.id).await.unwrap());
    assert!(repo.find(session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pg_duplicate_sequence_conflicts() {
    let Some(repo) = repository().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let session = seed(&repo, "cough").await;
    let stale = [Turn::new_user(session.id, "again".to_string(), 2).unwrap()];

    let err = repo.append_turns(session.id, &stale).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(repo.find(session.id).await.unwrap().unwrap().transcript.len(), 2);

    repo.delete(session.id).await.unwrap();
}

#[tokio::test]
async fn test_pg_pinned_listed_first() {
    let Some(repo) = repository().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let pinned = seed(&repo, "rash").await;
    let newer = seed(&repo, "sore throat").await;
    repo.toggle_pin(pinned.id).await.unwrap();

    let listed = repo.list(100).await.unwrap();
    let position = |id| listed.iter().position(|d| d.session.id == id).unwrap();
    assert!(position(pinned.id) < position(newer.id));
    assert!(listed
        .iter()
        .find(|d| d.session.id == pinned.id)
        .map(|d| d.transcript.len() == 2)
        .unwrap());

    repo.delete(pinned.id).await.unwrap();
    repo.delete(newer.id).await.unwrap();
}
