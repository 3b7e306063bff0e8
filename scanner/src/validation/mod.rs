//! Validation client for the remote ticket authority.
//!
//! [`ValidationClient`] performs the one consume-ticket request and returns
//! the response as it came off the wire. [`normalize`] turns that raw result
//! into a [`VerificationOutcome`](crate::types::VerificationOutcome). Every
//! interpretation of response shapes lives in `normalize`.

mod client;
mod error;
mod normalize;

pub use client::{RawValidation, ValidationBody, ValidationClient, ValidationConfig};
pub use error::ValidationError;
pub use normalize::normalize;
