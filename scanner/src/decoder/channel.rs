//! Decoder fed through an mpsc channel.

use super::{DecodeEvent, DecoderDevice, DecoderSession, DeviceFault};
use async_stream::stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};

/// Decoder whose events are pushed by another task
///
/// Keyboard-wedge scanners and the console front end type payloads into
/// the sender half. Events sent while nobody holds the device are dropped
/// on the next acquire, the way a camera does not see frames while it is
/// off.
#[derive(Debug, Clone)]
pub struct ChannelDevice {
    receiver: Arc<Mutex<mpsc::Receiver<DecodeEvent>>>,
    acquired: Arc<AtomicBool>,
}

impl ChannelDevice {
    /// Create a device and the sender that feeds it
    #[must_use]
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<DecodeEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let device = Self {
            receiver: Arc::new(Mutex::new(rx)),
            acquired: Arc::new(AtomicBool::new(false)),
        };
        (device, tx)
    }

    /// Whether a session currently holds the device
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::Acquire)
    }
}

impl DecoderDevice for ChannelDevice {
    fn acquire(&self) -> Result<DecoderSession, DeviceFault> {
        if self
            .acquired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DeviceFault::Busy);
        }

        if let Ok(mut rx) = self.receiver.try_lock() {
            let mut stale = 0_usize;
            while rx.try_recv().is_ok() {
                stale += 1;
            }
            if stale > 0 {
                tracing::debug!(stale, "Discarded input received while disarmed");
            }
        }

        let receiver = Arc::clone(&self.receiver);
        let events = stream! {
            loop {
                let next = receiver.lock().await.recv().await;
                match next {
                    Some(event) => yield event,
                    None => break,
                }
            }
        };

        let acquired = Arc::clone(&self.acquired);
        Ok(DecoderSession::new(events, move || {
            acquired.store(false, Ordering::Release);
        }))
    }
}

#[cfg(test)]
#[allow(clippy::panic)] // Test code can panic
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_events_in_order() {
        let (device, tx) = ChannelDevice::new(8);
        let mut session = device.acquire().unwrap_or_else(|fault| panic!("{fault}"));

        tx.send(DecodeEvent::NoCode).await.ok();
        tx.send(DecodeEvent::Payload("abc".to_string())).await.ok();

        assert_eq!(session.next_event().await, Some(DecodeEvent::NoCode));
        assert_eq!(
            session.next_event().await,
            Some(DecodeEvent::Payload("abc".to_string()))
        );
    }

    #[tokio::test]
    async fn second_acquire_is_busy_until_release() {
        let (device, _tx) = ChannelDevice::new(8);
        let session = device.acquire();
        assert!(session.is_ok());
        assert!(device.is_acquired());
        assert!(matches!(device.acquire(), Err(DeviceFault::Busy)));

        drop(session);
        assert!(!device.is_acquired());
        assert!(device.acquire().is_ok());
    }

    #[tokio::test]
    async fn input_while_released_is_discarded() {
        let (device, tx) = ChannelDevice::new(8);
        tx.send(DecodeEvent::Payload("typed-too-early".to_string())).await.ok();

        let mut session = device.acquire().unwrap_or_else(|fault| panic!("{fault}"));
        tx.send(DecodeEvent::Payload("fresh".to_string())).await.ok();

        assert_eq!(
            session.next_event().await,
            Some(DecodeEvent::Payload("fresh".to_string()))
        );
    }

    #[tokio::test]
    async fn stream_ends_when_sender_is_gone() {
        let (device, tx) = ChannelDevice::new(8);
        let mut session = device.acquire().unwrap_or_else(|fault| panic!("{fault}"));
        drop(tx);
        assert_eq!(session.next_event().await, None);
    }
}
