//! End-to-end client scenarios against a live server

use std::sync::Arc;
use std::time::Duration;

use pulse_client::{
    ChatController, ClientConfig, ClientError, ConversationState, FirstTurnPolicy,
    HttpSessionStore, Notice, SessionPatch, SessionStore, TurnStatus,
};
use pulse_llm::mock::MockLlmService;
use pulse_sessions::ChatSessionRepository;

use crate::common::{ScriptedLlm, TestServer};

fn client_config(server: &TestServer, timeout: Duration) -> ClientConfig {
    ClientConfig {
        api_base_url: server.base_url.clone(),
        request_timeout: timeout,
        first_turn_policy: FirstTurnPolicy::RequireProblem,
    }
}

fn store(server: &TestServer) -> HttpSessionStore {
    HttpSessionStore::new(&client_config(server, Duration::from_secs(5))).unwrap()
}

async fn controller(server: &TestServer) -> ChatController {
    let mut ctl = ChatController::new(Arc::new(store(server)), FirstTurnPolicy::RequireProblem);
    ctl.load().await;
    ctl
}

async fn start_chat(ctl: &mut ChatController, name: &str, problem: &str) -> uuid::Uuid {
    ctl.start_new_chat();
    ctl.conversation_mut().set_name(name);
    ctl.conversation_mut().set_problem(problem);
    ctl.submit_turn().await.unwrap();
    ctl.conversation().session_id().unwrap()
}

#[test_log::test(tokio::test)]
async fn scenario_a_first_turn_binds_session() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;

    ctl.conversation_mut().set_name("Jane");
    ctl.conversation_mut().set_problem("fever");
    ctl.conversation_mut().set_message("");
    assert_eq!(
        ctl.conversation().state(),
        ConversationState::AwaitingFirstTurn
    );

    ctl.submit_turn().await.unwrap();

    assert_eq!(ctl.conversation().state(), ConversationState::ActiveSession);
    let id = ctl.conversation().session_id().unwrap();
    assert!(server.repo.find(id).await.unwrap().is_some());
    assert_eq!(ctl.history().sessions().len(), 1);
    assert_eq!(ctl.history().sessions()[0].id, id);
    assert_eq!(ctl.conversation().transcript().len(), 2);
}

#[test_log::test(tokio::test)]
async fn scenario_b_blank_message_blocked() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;
    let id = start_chat(&mut ctl, "Jane", "fever").await;

    ctl.conversation_mut().set_message("   ");
    let err = ctl.submit_turn().await.unwrap_err();

    assert_eq!(err, ClientError::validation("message required"));
    let stored = server.repo.find(id).await.unwrap().unwrap();
    assert_eq!(stored.transcript.len(), 2);
}

#[test_log::test(tokio::test)]
async fn scenario_c_timeout_keeps_user_turn() {
    let server = TestServer::spawn(Arc::new(ScriptedLlm::slow(Duration::from_millis(800))))
        .await
        .unwrap();
    let store = HttpSessionStore::new(&client_config(&server, Duration::from_millis(100))).unwrap();
    let mut ctl = ChatController::new(Arc::new(store), FirstTurnPolicy::RequireProblem);

    ctl.conversation_mut().set_name("Jane");
    ctl.conversation_mut().set_problem("fever");
    let err = ctl.submit_turn().await.unwrap_err();

    assert_eq!(err, ClientError::Timeout);
    assert!(!ctl.is_loading());
    assert_eq!(
        ctl.notice(),
        Some(&Notice::Banner(ClientError::Timeout.to_string()))
    );
    let turns = ctl.conversation().transcript();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].content, "fever");
    assert_eq!(turns[0].status, TurnStatus::Failed);
    assert_ne!(ctl.conversation().state(), ConversationState::ActiveSession);
}

#[test_log::test(tokio::test)]
async fn scenario_d_delete_active_session() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;
    let id = start_chat(&mut ctl, "Jane", "fever").await;

    ctl.request_delete(id);
    ctl.confirm_delete().await.unwrap();

    assert_eq!(ctl.conversation().state(), ConversationState::Uninitialized);
    assert!(ctl.history().find(id).is_none());
    assert!(server.repo.find(id).await.unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn scenario_e_blank_rename_keeps_title() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;
    let id = start_chat(&mut ctl, "Jane", "fever").await;

    assert!(ctl.rename(id, " \t ").await.unwrap_err().is_validation());

    assert_eq!(ctl.history().find(id).unwrap().problem, "fever");
    let stored = server.repo.find(id).await.unwrap().unwrap();
    assert_eq!(stored.session.problem, "fever");
    assert_eq!(stored.session.updated_at, stored.session.created_at);
}

#[test_log::test(tokio::test)]
async fn continuation_sends_session_id_only() {
    let llm = MockLlmService::new();
    let server = TestServer::spawn(Arc::new(llm.clone())).await.unwrap();
    let mut ctl = controller(&server).await;
    let id = start_chat(&mut ctl, "Jane", "fever").await;

    ctl.conversation_mut().set_message("Three days");
    ctl.submit_turn().await.unwrap();

    assert_eq!(ctl.conversation().session_id(), Some(id));
    assert_eq!(ctl.conversation().transcript().len(), 4);
    assert_eq!(
        ctl.conversation().transcript()[3].content,
        "Mock response to: Three days"
    );

    let stored = server.repo.find(id).await.unwrap().unwrap();
    assert_eq!(stored.transcript.len(), 4);
    assert_eq!(stored.session.patient_name, "Jane");
    assert_eq!(llm.recorded_requests().len(), 2);
}

#[test_log::test(tokio::test)]
async fn refresh_twice_is_identical() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;
    start_chat(&mut ctl, "Jane", "cough").await;
    start_chat(&mut ctl, "Jane", "fever").await;

    let store = store(&server);
    let first = store.list_sessions().await.unwrap();
    let second = store.list_sessions().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test_log::test(tokio::test)]
async fn pinned_update_lists_first() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;
    let target = start_chat(&mut ctl, "Jane", "cough").await;
    start_chat(&mut ctl, "Jane", "fever").await;
    start_chat(&mut ctl, "Jane", "rash").await;

    let store = store(&server);
    let patch = SessionPatch {
        problem: None,
        pinned: Some(true),
    };
    store.update_session(target, &patch).await.unwrap();

    let sessions = store.list_sessions().await.unwrap();
    assert_eq!(sessions[0].id, target);
    assert!(sessions[1..].iter().all(|s| !s.pinned));
}

#[test_log::test(tokio::test)]
async fn toggle_pin_through_controller() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;
    let older = start_chat(&mut ctl, "Jane", "cough").await;
    start_chat(&mut ctl, "Jane", "fever").await;

    ctl.toggle_pin(older).await.unwrap();
    assert_eq!(ctl.history().sessions()[0].id, older);

    ctl.toggle_pin(older).await.unwrap();
    assert!(ctl.history().sessions().iter().all(|s| !s.pinned));
}

#[test_log::test(tokio::test)]
async fn rename_unknown_session_alerts_with_server_message() {
    let server = TestServer::spawn(Arc::new(MockLlmService::new()))
        .await
        .unwrap();
    let mut ctl = controller(&server).await;

    let err = ctl.rename(uuid::Uuid::new_v4(), "Flu").await.unwrap_err();

    assert_eq!(err, ClientError::Remote("Not found: Session not found".to_string()));
    assert_eq!(
        ctl.notice(),
        Some(&Notice::Alert("Not found: Session not found".to_string()))
    );
}

#[test_log::test(tokio::test)]
async fn unreachable_server_yields_empty_history() {
    let config = ClientConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        request_timeout: Duration::from_secs(2),
        first_turn_policy: FirstTurnPolicy::RequireProblem,
    };
    let mut offline = ChatController::new(
        Arc::new(HttpSessionStore::new(&config).unwrap()),
        FirstTurnPolicy::RequireProblem,
    );
    offline.load().await;
    assert!(offline.history().sessions().is_empty());
}
