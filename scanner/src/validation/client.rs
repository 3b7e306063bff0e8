//! HTTP client for the consume-ticket endpoint.

use super::error::ValidationError;
use crate::types::{Credential, Identifier, TicketSnapshot};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Connection settings for the authority
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Base URL, e.g. `https://api.tixbook.com`
    pub base_url: String,
    /// Timeout for the whole request
    pub timeout: Duration,
}

/// Response body of the consume-ticket endpoint
///
/// Every field is optional: deployed authorities disagree on which ones
/// they send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ValidationBody {
    /// `valid`, `already_scanned`, `invalid` or `error`
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Success flag used by older deployments instead of `status`
    #[serde(default)]
    pub success: Option<bool>,
    /// Ticket details; an unreadable snapshot is dropped, not an error
    #[serde(default, deserialize_with = "lenient_ticket")]
    pub ticket: Option<TicketSnapshot>,
}

/// The outcome is decided by status and message, so a malformed `ticket`
/// must not fail the whole body.
fn lenient_ticket<'de, D>(deserializer: D) -> Result<Option<TicketSnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match serde_json::from_value(value) {
        Ok(ticket) => Some(ticket),
        Err(error) => {
            tracing::warn!(%error, "Dropping unreadable ticket snapshot");
            None
        },
    }))
}

/// A consume-ticket response exactly as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValidation {
    /// HTTP status code
    pub http_status: u16,
    /// Parsed body, if there was a JSON body
    pub body: Option<ValidationBody>,
}

impl RawValidation {
    /// Status code is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.http_status >= 200 && self.http_status < 300
    }
}

/// Client for `GET {base}/api/booking/validate/{id}`
///
/// Issues exactly one request per call; there is no retry.
#[derive(Clone)]
pub struct ValidationClient {
    client: Client,
    base_url: Url,
}

impl ValidationClient {
    /// Create a client for `config`
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Transport`] if the base URL is not a valid
    /// absolute URL or the HTTP client cannot be built.
    pub fn new(config: &ValidationConfig) -> Result<Self, ValidationError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ValidationError::Transport(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ValidationError::Transport(format!(
                "invalid base URL: {}",
                config.base_url
            )));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Attempt to consume the ticket
    ///
    /// A 401 maps to [`ValidationError::Unauthorized`]; every other status is
    /// returned as-is for [`normalize`](super::normalize) to interpret.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for transport failures, timeouts, a
    /// rejected credential, or a 2xx response whose body is not valid JSON.
    #[tracing::instrument(skip(self, credential), fields(identifier = %identifier))]
    pub async fn consume(
        &self,
        identifier: &Identifier,
        credential: &Credential,
    ) -> Result<RawValidation, ValidationError> {
        let url = self.validate_url(identifier)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(credential.token())
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Authority responded");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ValidationError::Unauthorized);
        }

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice::<ValidationBody>(&bytes) {
                Ok(body) => Some(body),
                Err(e) if status.is_success() => return Err(ValidationError::Decode(e.to_string())),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring non-JSON error body");
                    None
                },
            }
        };

        Ok(RawValidation {
            http_status: status.as_u16(),
            body,
        })
    }

    fn validate_url(&self, identifier: &Identifier) -> Result<Url, ValidationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ValidationError::Transport("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "booking", "validate", identifier.as_str()]);
        Ok(url)
    }
}

impl std::fmt::Debug for ValidationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
