//! # tixscan Testing
//!
//! Testing utilities and helpers for tixscan.
//!
//! This crate provides:
//! - Deterministic clocks for the `Clock` environment trait
//! - A Given-When-Then harness for reducers
//! - Property-based testing strategies for scan payloads
//!
//! ## Example
//!
//! ```ignore
//! use tixscan_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(ScanReducer::new())
//!     .with_env(environment(test_clock()))
//!     .given_state(ScanState::default())
//!     .when_action(ScanAction::Dismiss)
//!     .then_state(|state| assert_eq!(state.phase, Phase::Idle))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use tixscan_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tixscan_testing::mocks::FixedClock;
    /// use tixscan_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same instant, so a test can hand one clone to the
    /// environment and keep another to advance time between scans.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a manual clock starting at `start`
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(start)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// The instant every deterministic clock in this crate starts from:
    /// 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }

    /// Create a manual clock starting at 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn manual_clock() -> ManualClock {
        ManualClock::new(epoch())
    }
}

/// Property-based testing utilities using proptest.
///
/// Strategies that generate the payload shapes a scanner sees in the field.
pub mod properties {
    use proptest::prelude::*;

    const HEX_DIGITS: &[u8] = b"0123456789abcdefABCDEF";

    /// Hex token with a length in `24..=32`, mixed case
    pub fn hex_token() -> impl Strategy<Value = String> {
        (24_usize..=32)
            .prop_flat_map(|len| {
                proptest::collection::vec(proptest::sample::select(HEX_DIGITS.to_vec()), len)
            })
            .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
    }

    /// Lowercase hex token in the canonical 24-character form
    pub fn canonical_token() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            proptest::sample::select(HEX_DIGITS[..16].to_vec()),
            24,
        )
        .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
    }

    /// Arbitrary text, including unicode and control characters
    pub fn any_payload() -> impl Strategy<Value = String> {
        any::<String>()
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, manual_clock, test_clock};
