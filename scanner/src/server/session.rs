//! Organizer session endpoints.

use super::error::ApiError;
use super::extractors::BearerToken;
use super::state::AuthorityState;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Body of `/api/auth/verify`
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Whether the token is accepted
    pub success: bool,
    /// Human-readable result
    pub message: &'static str,
}

/// `GET /api/auth/verify`
#[allow(clippy::unused_async)]
pub async fn verify(token: Option<BearerToken>) -> (StatusCode, Json<VerifyResponse>) {
    match token {
        Some(_) => (
            StatusCode::OK,
            Json(VerifyResponse {
                success: true,
                message: "Token is valid",
            }),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                success: false,
                message: "No token provided",
            }),
        ),
    }
}

/// Body of `/api/auth/organizer/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Organizer email
    pub email: String,
    /// Organizer password
    pub password: String,
}

/// Successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Session token
    pub token: String,
    /// Display name
    pub username: String,
    /// Account email
    pub email: String,
    /// Account role
    pub role: &'static str,
}

/// `POST /api/auth/organizer/login`
///
/// Any email with a local part and a non-empty password gets a session.
/// Blank fields are a 400.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AuthorityState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    let Some((username, _)) = request.email.split_once('@') else {
        return Err(ApiError::unauthorized("Invalid email or password"));
    };
    if username.is_empty() {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = format!(
        "session-{}-{}",
        username,
        state.clock.now().timestamp_millis()
    );
    tracing::info!(email = %request.email, "Organizer logged in");

    Ok(Json(LoginResponse {
        token,
        username: username.to_string(),
        email: request.email.clone(),
        role: "organizer",
    }))
}
