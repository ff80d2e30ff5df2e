//! Pulse AI LLM Service
//!
//! Provides chat completions for the medical assistant with support for:
//! - OpenAI-compatible chat completions APIs (Groq by default)
//! - Mock LLM service for testing and development
//! - Configurable model, sampling parameters and request timeout

pub mod mock;
pub mod openai;
pub mod prompt;
pub mod text;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use prompt::SYSTEM_PROMPT;
pub use text::clean_markdown_formatting;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_MAX_TOKENS: u32 = 600;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Stop sequences that keep the model from writing the patient's next line
pub const DEFAULT_STOP_SEQUENCES: &[&str] =
    &["\n\nPatient:", "\n\nUser:", "\n\n---", "END_OF_RESPONSE"];

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,

    #[error("AI service request timed out. Please try again.")]
    Timeout,
}

/// Role of a message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

/// A single message in the completion context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::Assistant,
            content: content.into(),
        }
    }
}

/// Completion request. An empty `model` means "use the provider default".
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
}

/// Completion response
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.9,
            frequency_penalty: 1.0,
            presence_penalty: 0.7,
            stop: DEFAULT_STOP_SEQUENCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// LLM service configuration.
#[derive(Clone)]
pub struct LlmConfig {
    /// Provider (groq, openai, mock)
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub sampling: SamplingParams,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("sampling", &self.sampling)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sampling: SamplingParams::default(),
        }
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let api_key = std::env::var("GROQ_API_KEY")
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .unwrap_or_default();

        if provider != "mock" && api_key.is_empty() {
            return Err(LlmError::Configuration(
                "GROQ_API_KEY environment variable is required".to_string(),
            ));
        }

        let max_tokens = match std::env::var("LLM_MAX_TOKENS") {
            Ok(v) => v
                .parse()
                .map_err(|_| LlmError::Configuration(format!("Invalid LLM_MAX_TOKENS: {}", v)))?,
            Err(_) => DEFAULT_MAX_TOKENS,
        };

        let timeout_secs = match std::env::var("LLM_TIMEOUT_SECS") {
            Ok(v) => v.parse().map_err(|_| {
                LlmError::Configuration(format!("Invalid LLM_TIMEOUT_SECS: {}", v))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            provider,
            api_key,
            default_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens,
            base_url: Some(
                std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ),
            timeout: Duration::from_secs(timeout_secs),
            sampling: SamplingParams::default(),
        })
    }
}

/// LLM service trait for different implementations.
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Run a chat completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when the request leaves `model` empty.
    fn default_model(&self) -> &str;
}

/// Factory for creating LlmService implementations.
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    /// Create an LlmService based on configuration.
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "groq" | "openai" => {
                tracing::info!(provider = %config.provider, model = %config.default_model, "Creating OpenAI-compatible LLM service");
                if config.api_key.is_empty() {
                    return Err(LlmError::Configuration(
                        "An API key is required for the OpenAI-compatible provider".to_string(),
                    ));
                }
                Ok(Box::new(openai::OpenAiCompatibleService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: groq, openai, mock",
                provider
            ))),
        }
    }
}
