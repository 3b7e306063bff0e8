//! Scan controller state.

use crate::decoder::DeviceFault;
use crate::types::{ScanHistory, VerificationOutcome};

/// Where the session is in the scan cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Scanner armed, nothing shown
    #[default]
    Idle,
    /// One payload is being extracted and validated
    Resolving,
    /// An outcome is displayed; scanner disarmed
    Showing,
    /// Waiting for the device to settle before re-arming
    Resetting,
}

impl Phase {
    /// Whether decode events may start a resolution
    #[must_use]
    pub const fn accepts_scans(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Session state owned by the controller
///
/// `generation` increases by one every time the scanner re-arms. Decode
/// events and outcomes tagged with an older generation are discarded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Current phase
    pub phase: Phase,
    /// Outcome on display, set only in `Showing`
    pub outcome: Option<VerificationOutcome>,
    /// Completed scans, newest first
    pub history: ScanHistory,
    /// Re-arm counter
    pub generation: u64,
    /// Device failure; scanning stays disabled once set
    pub device_fault: Option<DeviceFault>,
}

impl ScanState {
    /// Fresh session: idle, generation 0, empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a decode event for `generation` would start a resolution
    #[must_use]
    pub fn is_armed_for(&self, generation: u64) -> bool {
        self.phase.accepts_scans() && self.generation == generation && self.device_fault.is_none()
    }
}
