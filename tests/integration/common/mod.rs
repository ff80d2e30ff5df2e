//! Common test utilities and fixtures for integration tests
//!
//! This module provides shared infrastructure for all integration tests:
//! - The full application router over the in-memory session store
//! - A real server on an ephemeral port for client-driven tests
//! - Scripted, slow and failing LLM services
//! - Request and response helpers

use std::env;
use std::sync::{Arc, Once};
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use pulse_common::{Config, SessionStoreProvider};
use pulse_llm::{
    mock::MockLlmService, CompletionRequest, CompletionResponse, LlmError, LlmService,
};
use pulse_sessions::InMemoryChatSessionRepository;
use serde_json::Value;

static INIT: Once = Once::new();

/// Test environment configuration
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Postgres tests run only when this is set
    pub database_url: Option<String>,
}

impl TestConfig {
    pub fn from_env() -> Self {
        INIT.call_once(|| {
            dotenvy::from_filename(".env.test").ok();
            dotenvy::dotenv().ok();
        });

        Self {
            database_url: env::var("TEST_DATABASE_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// LLM that answers every request with the same text, optionally late
#[derive(Debug, Clone)]
pub struct ScriptedLlm {
    pub reply: String,
    pub delay: Duration,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            reply: "Sorry for the wait.".to_string(),
            delay,
        }
    }
}

#[async_trait::async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(CompletionResponse {
            content: self.reply.clone(),
            model: request.model,
            input_tokens: 0,
            output_tokens: 0,
            stop_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        "scripted"
    }
}

/// LLM whose provider always fails
pub struct FailingLlm;

#[async_trait::async_trait]
impl LlmService for FailingLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::Request("connection reset".to_string()))
    }

    fn default_model(&self) -> &str {
        "failing"
    }
}

pub fn test_config() -> Config {
    Config {
        session_store: SessionStoreProvider::Memory,
        database_url: None,
        allowed_origins: vec!["http://localhost:5173".to_string()],
        rust_log: "pulse=debug".to_string(),
        port: 0,
    }
}

/// Application over an in-memory store
pub struct TestApp {
    pub repo: Arc<InMemoryChatSessionRepository>,
    pub llm: MockLlmService,
    router: Router,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let llm = MockLlmService::new();
        Self::build(llm.clone(), Arc::new(llm))
    }

    pub fn with_llm(llm: Arc<dyn LlmService>) -> Result<Self> {
        Self::build(MockLlmService::new(), llm)
    }

    fn build(mock: MockLlmService, llm: Arc<dyn LlmService>) -> Result<Self> {
        let repo = Arc::new(InMemoryChatSessionRepository::new());
        let router = pulse_app::create_app(&test_config(), repo.clone(), llm)?;
        Ok(Self {
            repo,
            llm: mock,
            router,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// The full application served on 127.0.0.1 with an ephemeral port
pub struct TestServer {
    pub base_url: String,
    pub repo: Arc<InMemoryChatSessionRepository>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(llm: Arc<dyn LlmService>) -> Result<Self> {
        let repo = Arc::new(InMemoryChatSessionRepository::new());
        let app = pulse_app::create_app(&test_config(), repo.clone(), llm)?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("test server stopped: {}", e);
            }
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            repo,
            handle,
        })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Helper: build a JSON request
pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(b) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

/// Helper: parse response body as JSON Value
pub async fn parse_body(response: axum::http::Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
