//! Plain-text rendering of controller state for the operator console.

use crate::controller::{Phase, ScanState};
use crate::types::{ScanHistory, VerificationOutcome, VerificationStatus};
use std::fmt::Write;

/// Card title for an outcome kind
#[must_use]
pub const fn title(status: VerificationStatus) -> &'static str {
    match status {
        VerificationStatus::Valid => "Valid Ticket",
        VerificationStatus::AlreadyScanned => "Already Scanned",
        VerificationStatus::Invalid => "Invalid Ticket",
        VerificationStatus::Error => "Verification Error",
    }
}

const fn marker(status: VerificationStatus) -> &'static str {
    match status {
        VerificationStatus::Valid => "[OK]",
        VerificationStatus::AlreadyScanned => "[USED]",
        VerificationStatus::Invalid | VerificationStatus::Error => "[X]",
    }
}

/// Result card: title, message and ticket details
#[must_use]
pub fn render_outcome(outcome: &VerificationOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", marker(outcome.status()), title(outcome.status()));
    let _ = writeln!(out, "{}", outcome.message());

    if let Some(ticket) = outcome.ticket() {
        for (label, value) in [
            ("Event:      ", &ticket.event_name),
            ("Ticket Type:", &ticket.ticket_type),
            ("Name:       ", &ticket.owner_name),
        ] {
            if !value.is_empty() {
                let _ = writeln!(out, "  {label} {value}");
            }
        }
        if let Some(scanned_at) = ticket.scanned_at {
            let _ = writeln!(
                out,
                "  Scanned At:  {}",
                scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }
    out
}

/// Recent scans, newest first
#[must_use]
pub fn render_history(history: &ScanHistory) -> String {
    if history.is_empty() {
        return "No tickets scanned yet.\n".to_string();
    }

    let mut out = String::from("Recent Scans\n");
    for entry in history.iter() {
        let _ = writeln!(
            out,
            "  {:<6} {}  {}  ({})",
            marker(entry.outcome.status()),
            entry.scanned_at.format("%H:%M:%S"),
            entry.subject,
            entry.outcome.message()
        );
    }
    out
}

/// One-line status of the scanner
#[must_use]
pub fn render_phase(state: &ScanState) -> String {
    if let Some(fault) = &state.device_fault {
        return format!("Scanner unavailable: {fault}");
    }
    match state.phase {
        Phase::Idle => "Ready to scan.".to_string(),
        Phase::Resolving => "Verifying ticket...".to_string(),
        Phase::Showing => "Press Enter to scan the next ticket.".to_string(),
        Phase::Resetting => "Preparing scanner...".to_string(),
    }
}
