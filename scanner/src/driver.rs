//! Connects a decoder device to the scan store.
//!
//! The driver holds the device only while the controller is armed. Each
//! decoder session is tagged with the generation it was acquired under, and
//! is released (dropped) as soon as the controller leaves `Idle`; it is
//! re-acquired once the controller re-arms under the next generation.

use crate::controller::{ScanAction, ScanStore};
use crate::decoder::{DecoderDevice, DeviceFault};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

/// How often the driver re-checks store state while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Why the driver stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverExit {
    /// Shutdown was requested or the store is shutting down
    Shutdown,
    /// The device failed; scanning is disabled for this session
    DeviceFault(DeviceFault),
    /// The device stopped producing events
    DeviceClosed,
}

/// Pumps decode events from a device into a [`ScanStore`]
pub struct ScanDriver {
    store: ScanStore,
    device: Arc<dyn DecoderDevice>,
}

impl ScanDriver {
    /// Driver for `device` feeding `store`
    #[must_use]
    pub fn new(store: ScanStore, device: Arc<dyn DecoderDevice>) -> Self {
        Self { store, device }
    }

    /// Run until the store shuts down or the device fails
    pub async fn run(&self) -> DriverExit {
        self.run_until(std::future::pending()).await
    }

    /// Run until `shutdown` completes, the store shuts down, or the device fails
    ///
    /// The device is never held when this returns.
    pub async fn run_until<F>(&self, shutdown: F) -> DriverExit
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let mut actions = self.store.subscribe_actions();

        loop {
            let generation = match self.wait_until_armed(&mut actions, &mut shutdown).await {
                Ok(generation) => generation,
                Err(exit) => return exit,
            };

            let mut session = match self.device.acquire() {
                Ok(session) => session,
                Err(fault) => {
                    tracing::warn!(%fault, "Could not acquire decoder");
                    let _ = self
                        .store
                        .send(ScanAction::DeviceFailed {
                            fault: fault.clone(),
                        })
                        .await;
                    return DriverExit::DeviceFault(fault);
                },
            };
            tracing::debug!(generation, "Decoder armed");

            loop {
                tokio::select! {
                    () = &mut shutdown => return DriverExit::Shutdown,
                    event = session.next_event() => {
                        let Some(event) = event else {
                            tracing::info!("Decoder stopped producing events");
                            return DriverExit::DeviceClosed;
                        };
                        if self
                            .store
                            .send(ScanAction::Decoded { generation, event })
                            .await
                            .is_err()
                        {
                            return DriverExit::Shutdown;
                        }
                        if !self.store.state(|s| s.is_armed_for(generation)).await {
                            break;
                        }
                    },
                    () = tokio::time::sleep(POLL_INTERVAL) => {
                        if self.store.is_shutting_down() {
                            return DriverExit::Shutdown;
                        }
                        if !self.store.state(|s| s.is_armed_for(generation)).await {
                            break;
                        }
                    },
                }
            }

            drop(session);
            tracing::debug!(generation, "Decoder released");
        }
    }

    /// Wait for `Idle`; returns the generation to arm under
    async fn wait_until_armed<F>(
        &self,
        actions: &mut broadcast::Receiver<ScanAction>,
        shutdown: &mut Pin<&mut F>,
    ) -> Result<u64, DriverExit>
    where
        F: Future<Output = ()>,
    {
        loop {
            if self.store.is_shutting_down() {
                return Err(DriverExit::Shutdown);
            }

            let (idle, generation, fault) = self
                .store
                .state(|s| (s.phase.accepts_scans(), s.generation, s.device_fault.clone()))
                .await;
            if let Some(fault) = fault {
                return Err(DriverExit::DeviceFault(fault));
            }
            if idle {
                return Ok(generation);
            }

            tokio::select! {
                () = &mut *shutdown => return Err(DriverExit::Shutdown),
                received = actions.recv() => match received {
                    Ok(_) | Err(RecvError::Lagged(_)) => {},
                    Err(RecvError::Closed) => return Err(DriverExit::Shutdown),
                },
                () = tokio::time::sleep(POLL_INTERVAL) => {},
            }
        }
    }
}

impl std::fmt::Debug for ScanDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanDriver").finish_non_exhaustive()
    }
}
