//! Mock ticket authority over HTTP.
//!
//! Serves the same routes as the production authority, backed by an
//! [`InMemoryAuthority`](crate::authority::InMemoryAuthority). The scanner
//! can point `TIXSCAN_API_BASE_URL` at it for rehearsals and end-to-end
//! tests.
//!
//! # Routes
//!
//! ```text
//! GET  /health
//! GET  /api/booking/validate/:booking_id   (bearer or authToken cookie)
//! GET  /api/auth/verify                    (bearer or authToken cookie)
//! POST /api/auth/organizer/login
//! ```

use axum::Router;
use axum::routing::{get, post};

mod booking;
mod error;
mod extractors;
mod health;
mod session;
mod state;

pub use error::ApiError;
pub use extractors::BearerToken;
pub use state::AuthorityState;

/// Build the authority router
pub fn router(state: AuthorityState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/booking/validate/:booking_id", get(booking::validate_booking))
        .route("/api/auth/verify", get(session::verify))
        .route("/api/auth/organizer/login", post(session::login))
        .with_state(state)
}
