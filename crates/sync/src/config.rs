//! Client configuration, read from the environment.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
    #[error("{var} is not a usable base URL ({value:?}): {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub auth_token: Option<String>,
    /// Upper bound on one batch submission.
    pub submit_timeout: Duration,
    /// Upper bound on each reload request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Read `LISTINGS_API_URL`, `LISTINGS_AUTH_TOKEN`,
    /// `LISTINGS_SUBMIT_TIMEOUT_SECS` and `LISTINGS_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup("LISTINGS_API_URL") {
            Some(url) => url,
            None => {
                tracing::info!("LISTINGS_API_URL not set; using {DEFAULT_API_URL}");
                DEFAULT_API_URL.to_string()
            }
        };
        let reason = match reqwest::Url::parse(&api_url) {
            Ok(url) if url.cannot_be_a_base() => Some("cannot be a base".to_string()),
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = reason {
            return Err(ConfigError::InvalidUrl {
                var: "LISTINGS_API_URL",
                value: api_url,
                reason,
            });
        }

        let auth_token = lookup("LISTINGS_AUTH_TOKEN").filter(|t| !t.is_empty());

        Ok(Self {
            api_url,
            auth_token,
            submit_timeout: seconds(&lookup, "LISTINGS_SUBMIT_TIMEOUT_SECS", DEFAULT_SUBMIT_TIMEOUT)?,
            request_timeout: seconds(&lookup, "LISTINGS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT)?,
        })
    }
}

fn seconds<F>(lookup: &F, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidSeconds { var, value }),
    }
}
