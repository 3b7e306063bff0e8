//! Identifier extraction from raw QR payloads.
//!
//! Tickets printed over the years encode the booking token in three ways.
//! They are tried in a fixed order and the first match wins:
//!
//! 1. A JSON fragment: `{"bookingId":"686b..."}`
//! 2. A booking URL on a known host: `https://tixbook.com/booking/686b...`
//! 3. The bare hex token: `686b52a51f85f2ba7bf56f36`
//!
//! Anything else is not a ticket.

use crate::config::ConfigError;
use crate::types::Identifier;
use regex::Regex;

/// Which payload shapes the extractor recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// JSON keys that carry the token, matched case-insensitively
    pub token_fields: Vec<String>,
    /// Hosts whose `/booking/<hex>` URLs carry the token
    pub known_hosts: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            token_fields: vec!["bookingId".to_string(), "ticketId".to_string()],
            known_hosts: vec!["tixbook.com".to_string(), "www.tixbook.com".to_string()],
        }
    }
}

/// Compiled payload patterns
#[derive(Debug, Clone)]
pub struct Extractor {
    json_field: Regex,
    booking_url: Regex,
    bare_token: Regex,
}

impl Extractor {
    /// Compile the patterns for `config`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] if either list is empty, or
    /// [`ConfigError::Pattern`] if a pattern fails to compile.
    pub fn new(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        if config.token_fields.is_empty() {
            return Err(ConfigError::Empty("token_fields"));
        }
        if config.known_hosts.is_empty() {
            return Err(ConfigError::Empty("known_hosts"));
        }

        let fields = alternation(&config.token_fields);
        let hosts = alternation(&config.known_hosts);

        Ok(Self {
            json_field: Regex::new(&format!(
                r#""(?i:{fields})"\s*:\s*"([^"]*[^"\s][^"]*)""#
            ))?,
            booking_url: Regex::new(&format!(r"(?i:https?://(?:{hosts}))/booking/([0-9a-fA-F]+)"))?,
            bare_token: Regex::new(r"^[0-9a-fA-F]{24,32}$")?,
        })
    }

    /// Extract the identifier from a raw payload, if any pattern matches
    ///
    /// Total and pure: every input yields either an identifier or `None`.
    #[must_use]
    pub fn extract(&self, raw: &str) -> Option<Identifier> {
        if let Some(captures) = self.json_field.captures(raw) {
            return captures.get(1).map(|m| Identifier::new(m.as_str()));
        }

        if let Some(captures) = self.booking_url.captures(raw) {
            return captures.get(1).map(|m| Identifier::new(m.as_str()));
        }

        let trimmed = raw.trim();
        self.bare_token
            .is_match(trimmed)
            .then(|| Identifier::new(trimmed))
    }
}

impl Default for Extractor {
    #[allow(clippy::expect_used)] // Built from literal defaults, covered by tests
    fn default() -> Self {
        Self::new(&ExtractorConfig::default()).expect("default extractor patterns compile")
    }
}

fn alternation(items: &[String]) -> String {
    items
        .iter()
        .map(|item| regex::escape(item))
        .collect::<Vec<_>>()
        .join("|")
}
