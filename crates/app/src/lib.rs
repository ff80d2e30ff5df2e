//! Pulse AI application composition root
//!
//! Composes the domain routers with the shared infrastructure routes and
//! the HTTP middleware stack.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use pulse_common::Config;
use pulse_llm::LlmService;
use pulse_sessions::{ChatSessionRepository, SessionsState};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main application router with all routes and middleware
pub fn create_app(
    config: &Config,
    repo: Arc<dyn ChatSessionRepository>,
    llm: Arc<dyn LlmService>,
) -> Result<Router, anyhow::Error> {
    let sessions_state = SessionsState::new(repo, llm);

    // Build router: compose domain routers with shared infrastructure routes
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/", get(|| async { "Pulse AI API is running" }))
        .merge(pulse_sessions::routes().with_state(sessions_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.allowed_origins)?)
                .into_inner(),
        );

    Ok(app)
}

/// CORS restricted to the configured browser origins
fn cors_layer(origins: &[String]) -> Result<CorsLayer, anyhow::Error> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid allowed origin {}: {}", o, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
