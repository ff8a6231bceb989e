//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_API_BASE_URL: &str = "https://lifegiver13.pythonanywhere.com";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the backend, trailing slashes are trimmed by `ApiBase`.
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub session_poll_interval: Duration,
    pub user_agent: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test builds to keep tests hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_base_url = std::env::var("SAGA_API_BASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "SAGA_API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let session_path = std::env::var("SAGA_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.scroll_saga/session.json"));

        let poll_str = std::env::var("SAGA_SESSION_POLL_MS").unwrap_or_else(|_| "500".to_string());
        let poll_ms = poll_str.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue("SAGA_SESSION_POLL_MS".to_string(), e.to_string())
        })?;
        if poll_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "SAGA_SESSION_POLL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let user_agent =
            std::env::var("SAGA_USER_AGENT").unwrap_or_else(|_| "ScrollSaga/0.1".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            session_path,
            session_poll_interval: Duration::from_millis(poll_ms),
            user_agent,
            log_level,
        })
    }

    /// Configuration pointing at `api_base_url` with every other setting at its default.
    pub fn with_base_url(api_base_url: impl Into<String>, session_path: PathBuf) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            session_path,
            session_poll_interval: Duration::from_millis(500),
            user_agent: "ScrollSaga/0.1".to_string(),
            log_level: Level::INFO,
        }
    }
}
