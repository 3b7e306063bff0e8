//! Liveness endpoint.

use axum::http::StatusCode;

/// `GET /health`: 200 `ok` while the process is serving
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
