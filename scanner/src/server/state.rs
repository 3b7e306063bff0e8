//! Shared state for the authority handlers.

use crate::authority::InMemoryAuthority;
use std::sync::Arc;
use tixscan_core::environment::Clock;

/// State shared by every handler
#[derive(Clone)]
pub struct AuthorityState {
    /// Booking table
    pub authority: Arc<InMemoryAuthority>,
    /// Clock used to stamp issued sessions
    pub clock: Arc<dyn Clock>,
}

impl AuthorityState {
    /// State over `authority`
    #[must_use]
    pub fn new(authority: Arc<InMemoryAuthority>, clock: Arc<dyn Clock>) -> Self {
        Self { authority, clock }
    }
}

impl std::fmt::Debug for AuthorityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorityState")
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AuthorityState>();
    }
}
