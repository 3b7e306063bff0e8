//! Dependencies injected into the scan reducer.

use crate::authority::TicketAuthority;
use crate::auth::CredentialSource;
use crate::extract::Extractor;
use std::sync::Arc;
use std::time::Duration;
use tixscan_core::environment::Clock;

/// Collaborators of the scan controller
#[derive(Clone)]
pub struct ScanEnvironment {
    /// Consumes tickets
    pub authority: Arc<dyn TicketAuthority>,
    /// Supplies the bearer credential
    pub credentials: Arc<dyn CredentialSource>,
    /// Reads identifiers out of payloads
    pub extractor: Extractor,
    /// Timestamps history entries
    pub clock: Arc<dyn Clock>,
    /// Pause between leaving `Showing` and re-arming
    pub settle_delay: Duration,
}

impl ScanEnvironment {
    /// Environment with the default extractor and a 300ms settle delay
    #[must_use]
    pub fn new(
        authority: Arc<dyn TicketAuthority>,
        credentials: Arc<dyn CredentialSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authority,
            credentials,
            extractor: Extractor::default(),
            clock,
            settle_delay: Duration::from_millis(300),
        }
    }

    /// Replace the extractor
    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the settle delay
    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

impl std::fmt::Debug for ScanEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEnvironment")
            .field("extractor", &self.extractor)
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}
