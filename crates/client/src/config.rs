//! Client configuration loaded from the environment

use std::env;
use std::time::Duration;

use anyhow::Result;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which field a first submission must fill in besides the name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstTurnPolicy {
    #[default]
    RequireProblem,
    RequireMessage,
}

impl std::str::FromStr for FirstTurnPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "problem" => Ok(Self::RequireProblem),
            "message" => Ok(Self::RequireMessage),
            other => Err(anyhow::anyhow!(
                "Unknown first turn policy: {}. Supported policies: problem, message",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the session store API
    pub api_base_url: String,

    /// Bound on every store call; expiry surfaces as a timeout
    pub request_timeout: Duration,

    pub first_turn_policy: FirstTurnPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            first_turn_policy: FirstTurnPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timeout_secs = match env::var("PULSE_REQUEST_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid PULSE_REQUEST_TIMEOUT_SECS: {}", v))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let first_turn_policy = match env::var("PULSE_FIRST_TURN_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => FirstTurnPolicy::default(),
        };

        Ok(Self {
            api_base_url: env::var("PULSE_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            first_turn_policy,
        })
    }
}
