//! The mapping from raw authority responses to verification outcomes.
//!
//! | Input                                                         | Outcome                         |
//! |---------------------------------------------------------------|---------------------------------|
//! | `Err(Timeout \| Transport \| Decode)`                         | `error` (generic, cause logged) |
//! | `Err(Unauthorized)`, HTTP 401 or 403                          | `error` (signed-out message)    |
//! | 2xx, `status = "already_scanned"`                             | `already_scanned` + snapshot    |
//! | 4xx other than 401/403/404, message says "already (been) used/scanned/consumed" | `already_scanned` |
//! | 2xx, `status = "invalid"`, or HTTP 404                        | `invalid`                       |
//! | 2xx, `status = "valid"` or `success = true`                   | `valid` + snapshot              |
//! | 2xx, `status = "error"`                                       | `error` (generic)               |
//! | anything else                                                 | `error` (generic)               |
//!
//! Rows are tried top to bottom.

use super::client::{RawValidation, ValidationBody};
use super::error::ValidationError;
use crate::types::VerificationOutcome;

/// Map one consume-ticket result to the outcome shown to the operator
///
/// Raw transport or server text never ends up in an `error` outcome.
#[must_use]
pub fn normalize(result: Result<RawValidation, ValidationError>) -> VerificationOutcome {
    let raw = match result {
        Ok(raw) => raw,
        Err(ValidationError::Unauthorized) => {
            tracing::warn!("Authority rejected the scanner credential");
            return VerificationOutcome::error(VerificationOutcome::SIGNED_OUT);
        },
        Err(error) => {
            tracing::warn!(%error, "Ticket validation failed");
            return VerificationOutcome::error(VerificationOutcome::UNEXPECTED);
        },
    };

    let status = raw.http_status;
    let body = raw.body.unwrap_or_default();

    if status == 401 || status == 403 {
        tracing::warn!(status, "Authority rejected the scanner credential");
        return VerificationOutcome::error(VerificationOutcome::SIGNED_OUT);
    }

    let success = (200..300).contains(&status);
    let client_error = (400..500).contains(&status);
    let declared = body.status.as_deref();

    if success && declared == Some("already_scanned") {
        return already_scanned(body);
    }

    if client_error
        && status != 404
        && body
            .message
            .as_deref()
            .is_some_and(mentions_already_consumed)
    {
        return already_scanned(body);
    }

    if (success && declared == Some("invalid")) || status == 404 {
        return VerificationOutcome::invalid(
            body.message
                .unwrap_or_else(|| VerificationOutcome::NOT_FOUND.to_string()),
        );
    }

    if success && (declared == Some("valid") || body.success == Some(true)) {
        return VerificationOutcome::valid(
            body.message
                .unwrap_or_else(|| VerificationOutcome::ENTRY_ALLOWED.to_string()),
            body.ticket,
        );
    }

    if success && declared == Some("error") {
        tracing::warn!(message = ?body.message, "Authority reported a verification error");
    } else {
        tracing::warn!(
            status,
            declared_status = ?declared,
            message = ?body.message,
            "Unrecognized authority response"
        );
    }
    VerificationOutcome::error(VerificationOutcome::UNEXPECTED)
}

fn already_scanned(body: ValidationBody) -> VerificationOutcome {
    VerificationOutcome::already_scanned(
        body.message
            .unwrap_or_else(|| VerificationOutcome::ALREADY_USED.to_string()),
        body.ticket,
    )
}

/// "already used", "already been scanned", ... in any case
fn mentions_already_consumed(message: &str) -> bool {
    let message = message.to_lowercase();
    ["used", "scanned", "consumed"].iter().any(|verb| {
        message.contains(&format!("already {verb}"))
            || message.contains(&format!("already been {verb}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TicketSnapshot, VerificationStatus};

    fn snapshot() -> TicketSnapshot {
        TicketSnapshot {
            id: "686b52a51f85f2ba7bf56f36".to_string(),
            event_name: "Starlight Music Festival".to_string(),
            ticket_type: "VIP Access".to_string(),
            owner_name: "Jane Doe".to_string(),
            scanned_at: None,
        }
    }

    fn raw(http_status: u16, body: ValidationBody) -> Result<RawValidation, ValidationError> {
        Ok(RawValidation {
            http_status,
            body: Some(body),
        })
    }

    fn body(status: Option<&str>, message: Option<&str>) -> ValidationBody {
        ValidationBody {
            status: status.map(ToString::to_string),
            message: message.map(ToString::to_string),
            success: None,
            ticket: None,
        }
    }

    #[test]
    fn transport_failures_become_generic_errors() {
        for error in [
            ValidationError::Timeout,
            ValidationError::Transport("connection refused 10.0.0.7:443".to_string()),
            ValidationError::Decode("expected value at line 1".to_string()),
        ] {
            let outcome = normalize(Err(error));
            assert_eq!(outcome.status(), VerificationStatus::Error);
            assert_eq!(outcome.message(), VerificationOutcome::UNEXPECTED);
        }
    }

    #[test]
    fn unauthorized_becomes_signed_out_error() {
        let outcome = normalize(Err(ValidationError::Unauthorized));
        assert_eq!(outcome.status(), VerificationStatus::Error);
        assert_eq!(outcome.message(), VerificationOutcome::SIGNED_OUT);

        let outcome = normalize(raw(403, body(None, Some("Forbidden"))));
        assert_eq!(outcome.message(), VerificationOutcome::SIGNED_OUT);
    }

    #[test]
    fn explicit_already_scanned_status() {
        let mut b = body(Some("already_scanned"), None);
        b.ticket = Some(snapshot());
        let outcome = normalize(raw(200, b));
        assert_eq!(outcome.status(), VerificationStatus::AlreadyScanned);
        assert_eq!(outcome.message(), VerificationOutcome::ALREADY_USED);
        assert!(outcome.ticket().is_some());
    }

    #[test]
    fn already_used_message_with_client_error() {
        let outcome = normalize(raw(
            400,
            body(None, Some("This ticket has ALREADY BEEN USED at gate 3")),
        ));
        assert_eq!(outcome.status(), VerificationStatus::AlreadyScanned);
        assert_eq!(outcome.message(), "This ticket has ALREADY BEEN USED at gate 3");

        let outcome = normalize(raw(409, body(None, Some("Booking already consumed"))));
        assert_eq!(outcome.status(), VerificationStatus::AlreadyScanned);
    }

    #[test]
    fn already_message_on_404_is_still_invalid() {
        let outcome = normalize(raw(404, body(None, Some("already used"))));
        assert_eq!(outcome.status(), VerificationStatus::Invalid);
    }

    #[test]
    fn not_found_and_invalid_status() {
        let outcome = normalize(Ok(RawValidation {
            http_status: 404,
            body: None,
        }));
        assert_eq!(outcome.status(), VerificationStatus::Invalid);
        assert_eq!(outcome.message(), VerificationOutcome::NOT_FOUND);

        let outcome = normalize(raw(200, body(Some("invalid"), Some("This booking does not exist."))));
        assert_eq!(outcome.status(), VerificationStatus::Invalid);
        assert_eq!(outcome.message(), "This booking does not exist.");
        assert!(outcome.ticket().is_none());
    }

    #[test]
    fn invalid_drops_any_snapshot() {
        let mut b = body(Some("invalid"), None);
        b.ticket = Some(snapshot());
        assert!(normalize(raw(200, b)).ticket().is_none());
    }

    #[test]
    fn valid_by_status_or_success_flag() {
        let mut b = body(Some("valid"), None);
        b.ticket = Some(snapshot());
        let outcome = normalize(raw(200, b));
        assert_eq!(outcome.status(), VerificationStatus::Valid);
        assert_eq!(outcome.message(), VerificationOutcome::ENTRY_ALLOWED);
        assert_eq!(
            outcome.ticket().map(|t| t.owner_name.as_str()),
            Some("Jane Doe")
        );

        let mut b = body(None, Some("OK"));
        b.success = Some(true);
        assert_eq!(normalize(raw(201, b)).status(), VerificationStatus::Valid);
    }

    #[test]
    fn server_reported_error_hides_server_text() {
        let outcome = normalize(raw(200, body(Some("error"), Some("NullPointerException in db"))));
        assert_eq!(outcome.status(), VerificationStatus::Error);
        assert_eq!(outcome.message(), VerificationOutcome::UNEXPECTED);
    }

    #[test]
    fn unrecognized_shapes_are_errors() {
        let cases = [
            raw(200, body(None, None)),
            raw(200, body(Some("pending"), None)),
            raw(500, body(Some("valid"), None)),
            raw(400, body(None, Some("Booking ID is required"))),
            Ok(RawValidation {
                http_status: 302,
                body: None,
            }),
        ];
        for case in cases {
            let outcome = normalize(case);
            assert_eq!(outcome.status(), VerificationStatus::Error);
            assert_eq!(outcome.message(), VerificationOutcome::UNEXPECTED);
        }
    }
}
