//! Session management integration tests

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::{json_request, parse_body, TestApp};

async fn start(app: &TestApp, problem: &str) -> Value {
    let req = json_request(
        Method::POST,
        "/api/chat",
        Some(json!({"name": "Jane", "problem": problem})),
    );
    parse_body(app.router().oneshot(req).await.unwrap()).await
}

async fn list(app: &TestApp) -> Vec<Value> {
    let resp = app
        .router()
        .oneshot(json_request(Method::GET, "/api/sessions", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    parse_body(resp).await.as_array().unwrap().clone()
}

fn ids(sessions: &[Value]) -> Vec<String> {
    sessions
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}

mod test_listing {
    use super::*;

    #[tokio::test]
    async fn test_infrastructure_routes() {
        let app = TestApp::new().unwrap();

        let resp = app
            .router()
            .oneshot(json_request(Method::GET, "/", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .router()
            .oneshot(json_request(Method::GET, "/health", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_newest_first_and_repeatable() {
        let app = TestApp::new().unwrap();
        let older = start(&app, "cough").await;
        let newer = start(&app, "fever").await;

        let first = list(&app).await;
        assert_eq!(
            ids(&first),
            vec![
                newer["id"].as_str().unwrap().to_string(),
                older["id"].as_str().unwrap().to_string()
            ]
        );

        let second = list(&app).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pinned_via_patch_sorts_first() {
        let app = TestApp::new().unwrap();
        let target = start(&app, "cough").await;
        start(&app, "fever").await;
        start(&app, "rash").await;

        let uri = format!("/api/sessions/{}", target["id"].as_str().unwrap());
        let resp = app
            .router()
            .oneshot(json_request(Method::PATCH, &uri, Some(json!({"pinned": true}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let sessions = list(&app).await;
        assert_eq!(sessions[0]["id"], target["id"]);
        assert!(sessions[1..].iter().all(|s| s["pinned"] == false));
    }
}

mod test_mutations {
    use super::*;

    #[tokio::test]
    async fn test_rename_keeps_id_and_transcript() {
        let app = TestApp::new().unwrap();
        let created = start(&app, "fever").await;
        let uri = format!("/api/sessions/{}", created["id"].as_str().unwrap());

        let resp = app
            .router()
            .oneshot(json_request(
                Method::PATCH,
                &uri,
                Some(json!({"problem": "Seasonal flu"})),
            ))
            .await
            .unwrap();
        let body = parse_body(resp).await;

        assert_eq!(body["id"], created["id"]);
        assert_eq!(body["problem"], "Seasonal flu");
        assert_eq!(body["pinned"], false);
        assert_eq!(body["transcript"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_over_limit_rejected() {
        let app = TestApp::new().unwrap();
        let created = start(&app, "fever").await;
        let uri = format!("/api/sessions/{}", created["id"].as_str().unwrap());

        let resp = app
            .router()
            .oneshot(json_request(
                Method::PATCH,
                &uri,
                Some(json!({"problem": "x".repeat(201)})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_toggle_pin_is_server_side() {
        let app = TestApp::new().unwrap();
        let created = start(&app, "fever").await;
        let uri = format!(
            "/api/sessions/{}/pin/toggle",
            created["id"].as_str().unwrap()
        );

        let mut flags = Vec::new();
        for _ in 0..3 {
            let resp = app
                .router()
                .oneshot(json_request(Method::POST, &uri, None))
                .await
                .unwrap();
            flags.push(parse_body(resp).await["pinned"].as_bool().unwrap());
        }
        assert_eq!(flags, vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_delete_removes_from_listing() {
        let app = TestApp::new().unwrap();
        let keep = start(&app, "cough").await;
        let gone = start(&app, "fever").await;
        let uri = format!("/api/sessions/{}", gone["id"].as_str().unwrap());

        let resp = app
            .router()
            .oneshot(json_request(Method::DELETE, &uri, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let sessions = list(&app).await;
        assert_eq!(ids(&sessions), vec![keep["id"].as_str().unwrap().to_string()]);

        let resp = app
            .router()
            .oneshot(json_request(Method::DELETE, &uri, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
