//! Error types for the validation client.

use thiserror::Error;

/// Failures of the consume-ticket request itself
///
/// These never reach the operator verbatim; [`normalize`](super::normalize)
/// maps each of them to an `error` outcome and logs the cause.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Connection, TLS or protocol failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The authority rejected the credential
    #[error("credential rejected by authority")]
    Unauthorized,

    /// The response body could not be parsed
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ValidationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}
