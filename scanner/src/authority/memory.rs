//! In-process ticket authority.

use super::TicketAuthority;
use crate::types::{Credential, Identifier, TicketSnapshot, VerificationOutcome};
use chrono::Duration;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tixscan_core::environment::Clock;

/// Shortest bearer token the authority accepts
pub const MIN_TOKEN_LEN: usize = 10;

/// Consume-once booking table held in memory
///
/// A booking is consumed when its snapshot carries a `scanned_at`. The
/// check-and-mark happens under one lock, so two concurrent consumes of the
/// same identifier yield one `valid` and one `already_scanned`.
///
/// # Example
///
/// ```ignore
/// let authority = InMemoryAuthority::seeded(Arc::new(SystemClock));
/// let outcome = authority.consume(Identifier::new("686b52a51f85f2ba7bf56f36"), credential).await;
/// assert_eq!(outcome.status(), VerificationStatus::Valid);
/// ```
pub struct InMemoryAuthority {
    bookings: Mutex<HashMap<String, TicketSnapshot>>,
    clock: Arc<dyn Clock>,
    calls: AtomicUsize,
}

impl InMemoryAuthority {
    /// Empty authority
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            clock,
            calls: AtomicUsize::new(0),
        }
    }

    /// Authority holding the three sample bookings
    ///
    /// The Tech Conference pass was used two hours before `clock.now()`.
    #[must_use]
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        let used_at = clock.now() - Duration::hours(2);
        let authority = Self::new(clock);
        authority.insert(booking(
            "686b52a51f85f2ba7bf56f36",
            "Starlight Music Festival",
            "VIP Access",
            "Jane Doe",
        ));
        authority.insert(TicketSnapshot {
            scanned_at: Some(used_at),
            ..booking(
                "1234567890abcdef12345678",
                "Tech Conference 2024",
                "Full Pass",
                "Alice Johnson",
            )
        });
        authority.insert(booking(
            "abcdef1234567890abcdef12",
            "Sports Championship",
            "General Admission",
            "John Smith",
        ));
        authority
    }

    /// Add or replace a booking
    pub fn insert(&self, ticket: TicketSnapshot) {
        self.bookings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ticket.id.clone(), ticket);
    }

    /// Current snapshot of a booking
    #[must_use]
    pub fn get(&self, id: &str) -> Option<TicketSnapshot> {
        self.bookings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Number of consume calls received so far, including rejected ones
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn consume_now(&self, identifier: &Identifier, credential: &Credential) -> VerificationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if credential.token().len() < MIN_TOKEN_LEN {
            tracing::warn!("Rejected consume with a malformed credential");
            return VerificationOutcome::error(VerificationOutcome::SIGNED_OUT);
        }

        let mut bookings = self.bookings.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(ticket) = bookings.get_mut(identifier.as_str()) else {
            tracing::debug!(%identifier, "Unknown booking");
            return VerificationOutcome::invalid(VerificationOutcome::NOT_FOUND);
        };

        if ticket.scanned_at.is_some() {
            tracing::debug!(%identifier, "Booking already consumed");
            return VerificationOutcome::already_scanned(
                VerificationOutcome::ALREADY_USED,
                Some(ticket.clone()),
            );
        }

        ticket.scanned_at = Some(self.clock.now());
        tracing::info!(%identifier, "Booking consumed");
        VerificationOutcome::valid(VerificationOutcome::ENTRY_ALLOWED, Some(ticket.clone()))
    }
}

impl TicketAuthority for InMemoryAuthority {
    fn consume(
        &self,
        identifier: Identifier,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = VerificationOutcome> + Send + '_>> {
        Box::pin(async move { self.consume_now(&identifier, &credential) })
    }
}

impl std::fmt::Debug for InMemoryAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAuthority")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

fn booking(id: &str, event_name: &str, ticket_type: &str, owner_name: &str) -> TicketSnapshot {
    TicketSnapshot {
        id: id.to_string(),
        event_name: event_name.to_string(),
        ticket_type: ticket_type.to_string(),
        owner_name: owner_name.to_string(),
        scanned_at: None,
    }
}
