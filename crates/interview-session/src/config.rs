//! Interview session configuration.
//!
//! Configuration is loaded from environment variables. The optional API
//! bearer token is redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default REST backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_API_TIMEOUT_SECONDS: u64 = 10;

/// Default HTTP connect timeout in seconds.
pub const DEFAULT_API_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// Interview session configuration.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the interview REST backend (default: "http://localhost:8000").
    pub api_base_url: String,

    /// Room server endpoint used when the Token Service omits one.
    pub room_server_url: Option<String>,

    /// Optional bearer token sent to the backend.
    pub api_token: Option<SecretString>,

    /// HTTP request timeout. The controller itself imposes no timeouts.
    pub api_timeout: Duration,

    /// HTTP connect timeout.
    pub api_connect_timeout: Duration,

    /// Whether `interview_complete` still calls the Termination Authority
    /// when a server session id is known (default: true).
    pub force_end_on_complete: bool,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("room_server_url", &self.room_server_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_timeout", &self.api_timeout)
            .field("api_connect_timeout", &self.api_connect_timeout)
            .field("force_end_on_complete", &self.force_end_on_complete)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            room_server_url: None,
            api_token: None,
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECONDS),
            api_connect_timeout: Duration::from_secs(DEFAULT_API_CONNECT_TIMEOUT_SECONDS),
            force_end_on_complete: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is present but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `INTERVIEW_API_BASE_URL` is not
    /// an http(s) URL, if a timeout is not a positive whole number of
    /// seconds, or if `INTERVIEW_FORCE_END_ON_COMPLETE` is not a boolean.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_base_url = vars
            .get("INTERVIEW_API_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "INTERVIEW_API_BASE_URL must be an http(s) URL, got {api_base_url}"
            )));
        }

        let room_server_url = vars
            .get("INTERVIEW_ROOM_SERVER_URL")
            .filter(|s| !s.trim().is_empty())
            .cloned();

        let api_token = vars
            .get("INTERVIEW_API_TOKEN")
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::from(s.clone()));

        let api_timeout = Duration::from_secs(parse_seconds(
            vars,
            "INTERVIEW_API_TIMEOUT_SECONDS",
            DEFAULT_API_TIMEOUT_SECONDS,
        )?);

        let api_connect_timeout = Duration::from_secs(parse_seconds(
            vars,
            "INTERVIEW_API_CONNECT_TIMEOUT_SECONDS",
            DEFAULT_API_CONNECT_TIMEOUT_SECONDS,
        )?);

        let force_end_on_complete = match vars.get("INTERVIEW_FORCE_END_ON_COMPLETE") {
            None => true,
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "INTERVIEW_FORCE_END_ON_COMPLETE must be a boolean, got {raw}"
                ))
            })?,
        };

        Ok(Config {
            api_base_url,
            room_server_url,
            api_token,
            api_timeout,
            api_connect_timeout,
            force_end_on_complete,
        })
    }
}

fn parse_seconds(
    vars: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidValue(format!(
                "{key} must be a positive number of seconds, got {raw}"
            ))),
            Ok(seconds) => Ok(seconds),
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
