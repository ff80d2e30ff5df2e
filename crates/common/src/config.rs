//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Origins allowed by CORS when `ALLOWED_ORIGINS` is not set
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
];

/// Backing store for chat sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreProvider {
    Postgres,
    #[default]
    Memory,
}

impl std::str::FromStr for SessionStoreProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown session store provider: {}. Supported providers: postgres, memory",
                other
            )),
        }
    }
}

impl std::fmt::Display for SessionStoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which session store backs the API
    pub session_store: SessionStoreProvider,

    /// Database connection URL (required for the postgres store)
    pub database_url: Option<String>,

    /// Origins the browser client may call from
    pub allowed_origins: Vec<String>,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("session_store", &self.session_store)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_origins", &self.allowed_origins)
            .field("rust_log", &self.rust_log)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let session_store = match env::var("SESSION_STORE_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => SessionStoreProvider::default(),
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        if session_store == SessionStoreProvider::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL is required for the postgres session store"
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| {
                DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        Ok(Self {
            session_store,
            database_url,
            allowed_origins,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "pulse=debug".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
