//! The ticket authority seam.
//!
//! The controller never talks HTTP. It holds an `Arc<dyn TicketAuthority>`
//! and asks it to consume a ticket; production wires in [`HttpAuthority`],
//! tests and offline demos wire in [`InMemoryAuthority`].
//!
//! # Dyn Compatibility
//!
//! `consume` returns `Pin<Box<dyn Future>>` instead of being an `async fn`
//! so the authority can live behind a trait object inside the environment.

use crate::types::{Credential, Identifier, VerificationOutcome};
use std::future::Future;
use std::pin::Pin;

mod http;
mod memory;

pub use http::HttpAuthority;
pub use memory::{InMemoryAuthority, MIN_TOKEN_LEN};

/// Owner of ticket state; consumes a ticket at most once
pub trait TicketAuthority: Send + Sync {
    /// Attempt to consume the ticket and report what happened
    ///
    /// Never fails: transport and protocol problems are already folded into
    /// an `error` outcome.
    fn consume(
        &self,
        identifier: Identifier,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = VerificationOutcome> + Send + '_>>;
}
