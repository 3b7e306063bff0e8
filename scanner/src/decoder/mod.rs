//! Decoder device seam.
//!
//! A decoder is a camera (or a keyboard-wedge scanner) that, once acquired,
//! yields an endless stream of [`DecodeEvent`]s. The device is held by a
//! [`DecoderSession`]; dropping the session releases it, whichever way the
//! holder exits.

use futures::stream::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use thiserror::Error;

mod channel;

pub use channel::ChannelDevice;

/// One decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A code was read; the verbatim payload
    Payload(String),
    /// Nothing readable in frame this tick
    NoCode,
    /// The device failed
    Fault(DeviceFault),
}

/// Device-level failures, worded for the operator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceFault {
    /// Camera access was denied
    #[error("Camera permission denied. Allow camera access and reload the scanner.")]
    PermissionDenied,

    /// No camera attached
    #[error("No camera found on this device.")]
    NoCamera,

    /// The camera cannot be used for scanning
    #[error("This camera is not supported for scanning.")]
    Unsupported,

    /// Another application holds the camera
    #[error("The camera is in use by another application.")]
    Busy,

    /// The camera rejected the requested settings
    #[error("The camera could not be configured for scanning.")]
    ConstraintFailed,

    /// Anything else the device reports
    #[error("Scanner error: {0}")]
    Other(String),
}

type EventStream = Pin<Box<dyn Stream<Item = DecodeEvent> + Send>>;
type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Exclusive hold on a decoder device
///
/// The device is released exactly once, when the session is dropped.
pub struct DecoderSession {
    events: EventStream,
    release: Option<ReleaseHook>,
}

impl DecoderSession {
    /// Wrap an event stream and the action that releases the device
    pub fn new<S, F>(events: S, release: F) -> Self
    where
        S: Stream<Item = DecodeEvent> + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        Self {
            events: Box::pin(events),
            release: Some(Box::new(release)),
        }
    }

    /// Next decode attempt; `None` once the device stops producing
    pub async fn next_event(&mut self) -> Option<DecodeEvent> {
        self.events.next().await
    }
}

impl Drop for DecoderSession {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!("Releasing decoder device");
            release();
        }
    }
}

impl fmt::Debug for DecoderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderSession")
            .field("released", &self.release.is_none())
            .finish_non_exhaustive()
    }
}

/// A decoder that can be acquired repeatedly, one holder at a time
pub trait DecoderDevice: Send + Sync {
    /// Acquire the device
    ///
    /// # Errors
    ///
    /// Returns the [`DeviceFault`] that prevents scanning, e.g.
    /// [`DeviceFault::Busy`] while another session holds the device.
    fn acquire(&self) -> Result<DecoderSession, DeviceFault>;
}
