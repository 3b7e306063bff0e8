//! Test doubles for the decoder device.

use crate::decoder::{DecodeEvent, DecoderDevice, DecoderSession, DeviceFault};
use async_stream::stream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Decoder that replays a fixed script of events
///
/// Each session pops events off the shared script, waiting `gap` before
/// each one, and idles once the script is exhausted (a camera looking at
/// nothing). Releasing and re-acquiring continues where the last session
/// stopped.
#[derive(Debug, Clone)]
pub struct ScriptedDevice {
    script: Arc<Mutex<VecDeque<DecodeEvent>>>,
    gap: Duration,
    acquire_fault: Option<DeviceFault>,
    acquires: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl ScriptedDevice {
    /// Device replaying `events` with a 10ms gap
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = DecodeEvent>) -> Self {
        Self {
            script: Arc::new(Mutex::new(events.into_iter().collect())),
            gap: Duration::from_millis(10),
            acquire_fault: None,
            acquires: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Device replaying one payload per entry
    #[must_use]
    pub fn payloads<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(payloads.into_iter().map(|p| DecodeEvent::Payload(p.into())))
    }

    /// Device that cannot be acquired
    #[must_use]
    pub fn failing(fault: DeviceFault) -> Self {
        Self {
            acquire_fault: Some(fault),
            ..Self::new(Vec::new())
        }
    }

    /// Wait `gap` before each event
    #[must_use]
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }

    /// Successful acquisitions so far
    #[must_use]
    pub fn acquires(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    /// Releases so far
    #[must_use]
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Events not yet delivered
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl DecoderDevice for ScriptedDevice {
    fn acquire(&self) -> Result<DecoderSession, DeviceFault> {
        if let Some(fault) = &self.acquire_fault {
            return Err(fault.clone());
        }
        self.acquires.fetch_add(1, Ordering::SeqCst);

        let script = Arc::clone(&self.script);
        let gap = self.gap;
        let events = stream! {
            loop {
                tokio::time::sleep(gap).await;
                let next = script
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                match next {
                    Some(event) => yield event,
                    None => std::future::pending::<()>().await,
                }
            }
        };

        let releases = Arc::clone(&self.releases);
        Ok(DecoderSession::new(events, move || {
            releases.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
