//! Scan reconciliation controller.
//!
//! Turns decode events into at most one authority call at a time and drives
//! the operator-facing phase machine:
//!
//! ```text
//!   Idle ──decode──▶ Resolving ──outcome──▶ Showing ──dismiss──▶ Resetting
//!    ▲                                                              │
//!    └────────────────────── settle delay, generation + 1 ──────────┘
//! ```
//!
//! The reducer is pure; the authority call and the settle timer are effects
//! run by the [`Store`](tixscan_runtime::Store).

mod actions;
mod environment;
mod reducer;
mod types;

#[cfg(test)]
mod tests;

pub use actions::ScanAction;
pub use environment::ScanEnvironment;
pub use reducer::ScanReducer;
pub use types::{Phase, ScanState};

/// Store type driving a scanner session
pub type ScanStore = tixscan_runtime::Store<ScanState, ScanAction, ScanEnvironment, ScanReducer>;
