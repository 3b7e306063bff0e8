//! # tixscan
//!
//! Staff-facing ticket scanner. Turns raw QR payloads into booking
//! identifiers, consumes them against the ticket authority exactly once, and
//! keeps the scanner from double-submitting while a result is on screen.
//!
//! ## Architecture
//!
//! ```text
//! DecoderDevice ─▶ ScanDriver ─▶ Store<ScanReducer>
//!                                   │
//!                                   ├─ Extractor          (payload → identifier)
//!                                   ├─ CredentialSource   (bearer token)
//!                                   └─ TicketAuthority    (consume-once)
//!                                         ├─ HttpAuthority (ValidationClient + normalize)
//!                                         └─ InMemoryAuthority
//! ```
//!
//! The `tixscan` binary wires these to a line console; `tixscan-authority`
//! serves [`InMemoryAuthority`](authority::InMemoryAuthority) over HTTP for
//! rehearsals.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod auth;
pub mod authority;
pub mod config;
pub mod console;
pub mod controller;
pub mod decoder;
pub mod driver;
pub mod extract;
pub mod mocks;
pub mod server;
pub mod types;
pub mod validation;
pub mod view;

pub use authority::{HttpAuthority, InMemoryAuthority, TicketAuthority};
pub use config::{Config, ConfigError, ServerConfig};
pub use controller::{Phase, ScanAction, ScanEnvironment, ScanReducer, ScanState, ScanStore};
pub use driver::{DriverExit, ScanDriver};
pub use extract::{Extractor, ExtractorConfig};
pub use types::{
    Credential, HistoryEntry, Identifier, ScanHistory, TicketSnapshot, VerificationOutcome,
    VerificationStatus,
};
