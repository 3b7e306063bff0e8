//! Booking validation handler.

use super::extractors::BearerToken;
use super::state::AuthorityState;
use crate::authority::TicketAuthority;
use crate::types::{Identifier, VerificationOutcome};
use axum::{
    Json,
    extract::{Path, State},
};

/// `GET /api/booking/validate/:booking_id`
///
/// Consumes the booking and answers `{status, message, ticket?}` with 200,
/// whatever the outcome.
#[tracing::instrument(skip_all)]
pub async fn validate_booking(
    State(state): State<AuthorityState>,
    BearerToken(token): BearerToken,
    Path(booking_id): Path<String>,
) -> Json<VerificationOutcome> {
    tracing::debug!(%booking_id, "Validate booking");
    let outcome = state
        .authority
        .consume(Identifier::new(booking_id), token)
        .await;
    Json(outcome)
}
