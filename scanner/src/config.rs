//! Configuration management for the scanner and the mock authority.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Binaries call `dotenvy::dotenv()` first so a local `.env` file works too.

use crate::extract::ExtractorConfig;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// A list that must name at least one entry is empty
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// An extractor pattern failed to compile
    #[error("invalid extractor pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Which ticket authority the scanner talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityKind {
    /// Remote authority over HTTP
    Http,
    /// Seeded in-process authority (demos, offline rehearsal)
    Memory,
}

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote authority, without trailing slash
    pub api_base_url: String,
    /// Per-request timeout for authority calls
    pub request_timeout: Duration,
    /// Pre-issued bearer token
    pub token: Option<String>,
    /// Organizer email for password login
    pub email: Option<String>,
    /// Organizer password for password login
    pub password: Option<String>,
    /// Authority backend
    pub authority: AuthorityKind,
    /// Settling delay between dismiss and re-arm
    pub settle_delay: Duration,
    /// Payload extraction settings
    pub extractor: ExtractorConfig,
}

/// Mock authority server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a key maps to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("TIXSCAN_API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout = Duration::from_secs(parse_or(
            &lookup,
            "TIXSCAN_REQUEST_TIMEOUT_SECS",
            10,
        )?);

        let authority = match lookup("TIXSCAN_AUTHORITY").as_deref() {
            None | Some("http") => AuthorityKind::Http,
            Some("memory") => AuthorityKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TIXSCAN_AUTHORITY",
                    value: other.to_string(),
                });
            },
        };

        let settle_delay =
            Duration::from_millis(parse_or(&lookup, "TIXSCAN_SETTLE_DELAY_MS", 300)?);

        let mut extractor = ExtractorConfig::default();
        if let Some(fields) = lookup("TIXSCAN_TOKEN_FIELDS") {
            extractor.token_fields = split_list(&fields);
        }
        if let Some(hosts) = lookup("TIXSCAN_KNOWN_HOSTS") {
            extractor.known_hosts = split_list(&hosts);
        }

        Ok(Self {
            api_base_url,
            request_timeout,
            token: lookup("TIXSCAN_TOKEN").filter(|t| !t.is_empty()),
            email: lookup("TIXSCAN_EMAIL").filter(|e| !e.is_empty()),
            password: lookup("TIXSCAN_PASSWORD"),
            authority,
            settle_delay,
            extractor,
        })
    }
}

impl ServerConfig {
    /// Load server configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a non-numeric port.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| env::var(key).ok();
        Ok(Self {
            host: lookup("AUTHORITY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "AUTHORITY_PORT", 8080)?,
        })
    }

    /// Socket address string for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
