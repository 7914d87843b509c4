//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use reqwest::Url;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::session::poller::PollPolicy;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: Url,
    pub api_token: Option<String>,
    pub storage_url: Url,
    pub storage_bucket: String,
    pub storage_key: Option<String>,
    pub log_level: Level,
    pub request_timeout: Duration,
    pub download_timeout: Duration,
    pub poll_policy: PollPolicy,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Backend and Storage Endpoints ---
        let api_base_url = required_url("API_BASE_URL")?;
        let api_token = std::env::var("API_TOKEN").ok();
        let storage_url = required_url("STORAGE_URL")?;
        let storage_bucket =
            std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "materials-all".to_string());
        let storage_key = std::env::var("STORAGE_KEY").ok();

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Timeouts ---
        let request_timeout = Duration::from_secs(parsed_or("REQUEST_TIMEOUT_SECS", 30)?);
        let download_timeout = Duration::from_secs(parsed_or("DOWNLOAD_TIMEOUT_SECS", 60)?);

        // --- Generation Polling ---
        let poll_policy = PollPolicy {
            interval: Duration::from_millis(parsed_or("POLL_INTERVAL_MS", 2000)?),
            backoff: parsed_or("POLL_BACKOFF", 1.0)?,
            max_interval: Duration::from_millis(parsed_or("POLL_MAX_INTERVAL_MS", 10_000)?),
            max_polls: parsed_or("POLL_MAX_ATTEMPTS", 60)?,
            max_elapsed: Duration::from_secs(parsed_or("POLL_MAX_ELAPSED_SECS", 300)?),
        };
        if poll_policy.backoff < 1.0 {
            return Err(ConfigError::InvalidValue(
                "POLL_BACKOFF".to_string(),
                "backoff factor must be at least 1.0".to_string(),
            ));
        }

        Ok(Self {
            api_base_url,
            api_token,
            storage_url,
            storage_bucket,
            storage_key,
            log_level,
            request_timeout,
            download_timeout,
            poll_policy,
        })
    }
}

fn required_url(name: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))?;
    // Relative joins drop the last path segment unless the base ends with '/'.
    let normalized = if raw.ends_with('/') { raw } else { format!("{}/", raw) };
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn parsed_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
