//! Domain types shared by the extractor, the validation client and the
//! scan controller.
//!
//! A scan produces exactly one [`VerificationOutcome`]. Outcomes are built only
//! through their constructors so that the ticket snapshot rule holds
//! everywhere: `invalid` and `error` outcomes never carry a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Canonical ticket/booking token after extraction
///
/// Opaque: the scanner never inspects or normalizes it after extraction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier from an already-extracted token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the inner token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer credential supplied by the auth collaborator
///
/// `Debug` redacts the token so it never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a bearer token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header
    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

/// The four-way result of validating one scan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Ticket consumed by this scan; entry allowed
    Valid,
    /// Ticket had already been consumed
    AlreadyScanned,
    /// Payload unrecognized or ticket unknown to the authority
    Invalid,
    /// Verification could not be completed
    Error,
}

impl VerificationStatus {
    /// Wire/metrics label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::AlreadyScanned => "already_scanned",
            Self::Invalid => "invalid",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket details as reported by the authority
///
/// `scanned_at` is the consumption time: present once the ticket has been used.
/// Authorities may omit descriptive fields; they read as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSnapshot {
    /// Ticket/booking identifier
    #[serde(default)]
    pub id: String,
    /// Event the ticket admits to
    #[serde(default)]
    pub event_name: String,
    /// Ticket tier
    #[serde(default)]
    pub ticket_type: String,
    /// Ticket holder
    #[serde(default)]
    pub owner_name: String,
    /// When the ticket was consumed
    #[serde(default)]
    pub scanned_at: Option<DateTime<Utc>>,
}

/// Outcome of validating one scan
///
/// Serializes to the authority's wire shape `{status, message, ticket?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    status: VerificationStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticket: Option<TicketSnapshot>,
}

impl VerificationOutcome {
    /// Default message for a freshly consumed ticket
    pub const ENTRY_ALLOWED: &'static str = "Entry Allowed";
    /// Default message for a ticket that was already consumed
    pub const ALREADY_USED: &'static str = "This ticket has already been used.";
    /// Default message for a ticket the authority does not know
    pub const NOT_FOUND: &'static str = "This ticket does not exist.";
    /// Message for payloads the extractor cannot read
    pub const MALFORMED: &'static str = "Unrecognized QR code format.";
    /// Generic operator-facing message for any failure
    pub const UNEXPECTED: &'static str = "An unexpected error occurred during verification.";
    /// Operator-facing message when the session is missing or rejected
    pub const SIGNED_OUT: &'static str = "Scanner is not signed in. Please log in again.";

    /// Ticket consumed by this scan
    #[must_use]
    pub fn valid(message: impl Into<String>, ticket: Option<TicketSnapshot>) -> Self {
        Self {
            status: VerificationStatus::Valid,
            message: message.into(),
            ticket,
        }
    }

    /// Ticket consumed earlier
    #[must_use]
    pub fn already_scanned(message: impl Into<String>, ticket: Option<TicketSnapshot>) -> Self {
        Self {
            status: VerificationStatus::AlreadyScanned,
            message: message.into(),
            ticket,
        }
    }

    /// Unknown or unreadable ticket
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Invalid,
            message: message.into(),
            ticket: None,
        }
    }

    /// Verification failed
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Error,
            message: message.into(),
            ticket: None,
        }
    }

    /// Local outcome for a payload the extractor rejected
    #[must_use]
    pub fn malformed() -> Self {
        Self::invalid(Self::MALFORMED)
    }

    /// Outcome kind
    #[must_use]
    pub const fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Operator-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Ticket details, for `valid` and `already_scanned` only
    #[must_use]
    pub const fn ticket(&self) -> Option<&TicketSnapshot> {
        self.ticket.as_ref()
    }
}

/// One completed scan in the session history
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// The outcome shown to the operator
    pub outcome: VerificationOutcome,
    /// Resolved identifier, or the raw payload when extraction failed
    pub subject: String,
    /// Client wall-clock time at which the outcome was produced
    pub scanned_at: DateTime<Utc>,
}

/// Newest-first, append-only scan history
///
/// Entries cannot be removed or edited once recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanHistory {
    entries: VecDeque<HistoryEntry>,
}

impl ScanHistory {
    /// Empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed scan at the front
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Most recent entry
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Number of completed scans
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before the first completed scan
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
