//! Remote authority over HTTP.

use super::TicketAuthority;
use crate::types::{Credential, Identifier, VerificationOutcome};
use crate::validation::{ValidationClient, normalize};
use std::future::Future;
use std::pin::Pin;

/// [`ValidationClient`] followed by [`normalize`]
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: ValidationClient,
}

impl HttpAuthority {
    /// Wrap a configured client
    #[must_use]
    pub const fn new(client: ValidationClient) -> Self {
        Self { client }
    }
}

impl TicketAuthority for HttpAuthority {
    fn consume(
        &self,
        identifier: Identifier,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = VerificationOutcome> + Send + '_>> {
        Box::pin(async move { normalize(self.client.consume(&identifier, &credential).await) })
    }
}
