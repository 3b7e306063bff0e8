//! Scanner session and credentials.
//!
//! The controller only asks a [`CredentialSource`] for the current bearer
//! token. How the token was obtained (pre-issued, or an organizer password
//! login through [`LoginClient`]) is decided at startup.

use crate::types::Credential;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

/// Supplies the bearer credential for authority calls
pub trait CredentialSource: Send + Sync {
    /// The current credential, or `None` when signed out
    fn current(&self) -> Option<Credential>;
}

/// A credential fixed at startup
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    /// Always returns `credential`
    #[must_use]
    pub const fn new(credential: Credential) -> Self {
        Self(Some(credential))
    }

    /// Always signed out
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn current(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// Mutable session: set after login, cleared on logout or rejection
#[derive(Debug, Default)]
pub struct SessionStore {
    credential: RwLock<Option<Credential>>,
}

impl SessionStore {
    /// Signed-out session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential
    pub fn set(&self, credential: Credential) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    /// Forget the credential
    pub fn clear(&self) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl CredentialSource for SessionStore {
    fn current(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Login and verification errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// The authority refused the login; carries its message
    #[error("login rejected: {0}")]
    Rejected(String),

    /// Network failure or timeout
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected response shape
    #[error("unexpected login response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Successful organizer login
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginSession {
    /// Bearer token for subsequent calls
    pub token: String,
    /// Display name
    #[serde(default)]
    pub username: String,
    /// Account email
    #[serde(default)]
    pub email: String,
    /// Account role, e.g. `organizer`
    #[serde(default)]
    pub role: String,
    /// Account id, when the authority sends one
    #[serde(default)]
    pub id: Option<String>,
}

impl LoginSession {
    /// The session token as a credential
    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential::new(self.token.clone())
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct VerifyBody {
    #[serde(default)]
    success: bool,
}

/// Client for the organizer auth endpoints
#[derive(Debug, Clone)]
pub struct LoginClient {
    client: Client,
    base_url: String,
}

impl LoginClient {
    /// Create a client against `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Log in with organizer email and password
    ///
    /// # Errors
    ///
    /// - [`AuthError::Rejected`] with the authority's message on a non-2xx answer
    /// - [`AuthError::Network`] on transport failure
    /// - [`AuthError::InvalidResponse`] if the answer carries no token
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let response = self
            .client
            .post(format!("{}/api/auth/organizer/login", self.base_url))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<MessageBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "Login failed".to_string());
            tracing::warn!(status = status.as_u16(), %message, "Login rejected");
            return Err(AuthError::Rejected(message));
        }

        let session: LoginSession = response.json().await?;
        if session.token.is_empty() {
            return Err(AuthError::InvalidResponse("empty token".to_string()));
        }

        tracing::info!(username = %session.username, role = %session.role, "Logged in");
        Ok(session)
    }

    /// Ask the authority whether `credential` is still accepted
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] on transport failure. A rejected
    /// credential is `Ok(false)`, not an error.
    #[tracing::instrument(skip_all)]
    pub async fn verify(&self, credential: &Credential) -> Result<bool, AuthError> {
        let response = self
            .client
            .get(format!("{}/api/auth/verify", self.base_url))
            .bearer_auth(credential.token())
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            status if status.is_success() => Ok(response
                .json::<VerifyBody>()
                .await
                .map(|body| body.success)
                .unwrap_or(false)),
            status => {
                tracing::warn!(status = status.as_u16(), "Unexpected verify response");
                Ok(false)
            },
        }
    }
}
