//! Inputs to the scan controller.

use crate::decoder::{DecodeEvent, DeviceFault};
use crate::types::VerificationOutcome;

/// Everything that can happen to a scanner session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanAction {
    /// The decoder produced an event while armed under `generation`
    Decoded {
        /// Generation the decoder session was acquired under
        generation: u64,
        /// What the decoder saw
        event: DecodeEvent,
    },

    /// The authority answered (or a local outcome was produced)
    Resolved {
        /// Generation the resolution started under
        generation: u64,
        /// Identifier, or the raw payload when extraction failed
        subject: String,
        /// The normalized outcome
        outcome: VerificationOutcome,
    },

    /// Operator dismissed the displayed outcome
    Dismiss,

    /// Operator abandoned the current scan, in flight or displayed
    ForceReset,

    /// The settle delay after a dismiss or reset has passed
    SettleElapsed {
        /// Generation the reset was scheduled under
        generation: u64,
    },

    /// The decoder could not be acquired
    DeviceFailed {
        /// Why
        fault: DeviceFault,
    },
}
