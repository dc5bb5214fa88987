//! Client configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default unread-count polling interval.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote finance API (no trailing slash)
    pub api_base_url: String,
    /// Directory holding the persisted session mirror
    pub state_dir: PathBuf,
    /// Interval between unread-count polls while authenticated
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let poll_secs = match env::var("FINTRACK_POLL_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("FINTRACK_POLL_INTERVAL_SECS"))?,
            Err(_) => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(Self {
            api_base_url: env::var("FINTRACK_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("FINTRACK_API_URL"))?,
            state_dir: env::var("FINTRACK_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".fintrack")),
            poll_interval: Duration::from_secs(poll_secs),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            state_dir: PathBuf::from(".fintrack-test"),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
