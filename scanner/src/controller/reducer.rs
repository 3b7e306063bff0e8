//! Scan reconciliation reducer.

use super::actions::ScanAction;
use super::environment::ScanEnvironment;
use super::types::{Phase, ScanState};
use crate::decoder::{DecodeEvent, DeviceFault};
use crate::types::{HistoryEntry, VerificationOutcome};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tixscan_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Reducer for one scanner session
///
/// Guard: a payload starts a resolution only while `Idle`, under the current
/// generation, with a working device and a non-blank payload. Everything else
/// is dropped without a transition, so at most one authority call is ever in
/// flight per session.
#[derive(Clone, Debug, Default)]
pub struct ScanReducer;

impl ScanReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn on_payload(
        state: &mut ScanState,
        generation: u64,
        raw: String,
        env: &ScanEnvironment,
    ) -> SmallVec<[Effect<ScanAction>; 4]> {
        if let Some(reason) = rejection(state, generation, &raw) {
            tracing::debug!(
                reason,
                generation,
                current_generation = state.generation,
                phase = ?state.phase,
                "Dropped decode event"
            );
            metrics::counter!("scanner.decode.dropped", "reason" => reason).increment(1);
            return smallvec![Effect::None];
        }

        state.phase = Phase::Resolving;

        let Some(identifier) = env.extractor.extract(&raw) else {
            tracing::info!("Unrecognized payload");
            Self::complete(state, raw, VerificationOutcome::malformed(), env);
            return smallvec![Effect::None];
        };

        let Some(credential) = env.credentials.current() else {
            tracing::warn!(%identifier, "No credential; not calling the authority");
            Self::complete(
                state,
                identifier.to_string(),
                VerificationOutcome::error(VerificationOutcome::SIGNED_OUT),
                env,
            );
            return smallvec![Effect::None];
        };

        tracing::debug!(%identifier, generation, "Resolving scan");
        let authority = env.authority.clone();
        smallvec![Effect::future(async move {
            let subject = identifier.to_string();
            // Resolving must always be left, even if the authority panics
            let outcome = AssertUnwindSafe(authority.consume(identifier, credential))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    tracing::error!(%subject, "Ticket authority panicked");
                    VerificationOutcome::error(VerificationOutcome::UNEXPECTED)
                });
            ScanAction::Resolved {
                generation,
                subject,
                outcome,
            }
        })]
    }

    /// Record the outcome and show it
    fn complete(
        state: &mut ScanState,
        subject: String,
        outcome: VerificationOutcome,
        env: &ScanEnvironment,
    ) {
        metrics::counter!("scanner.outcomes", "status" => outcome.status().as_str()).increment(1);
        tracing::info!(status = %outcome.status(), %subject, "Scan resolved");

        state.history.record(HistoryEntry {
            outcome: outcome.clone(),
            subject,
            scanned_at: env.clock.now(),
        });
        state.outcome = Some(outcome);
        state.phase = Phase::Showing;
    }

    /// Leave `Resolving`/`Showing` and schedule the re-arm
    fn begin_reset(state: &mut ScanState, env: &ScanEnvironment) -> SmallVec<[Effect<ScanAction>; 4]> {
        state.phase = Phase::Resetting;
        state.outcome = None;
        smallvec![Effect::delay(
            env.settle_delay,
            ScanAction::SettleElapsed {
                generation: state.generation,
            }
        )]
    }

    fn record_fault(state: &mut ScanState, fault: DeviceFault) {
        if state.device_fault.is_none() {
            tracing::warn!(%fault, "Decoder failed; scanning disabled for this session");
            state.device_fault = Some(fault);
        }
    }
}

/// Why a payload must not start a resolution, if it must not
fn rejection(state: &ScanState, generation: u64, raw: &str) -> Option<&'static str> {
    if raw.trim().is_empty() {
        Some("empty")
    } else if generation != state.generation {
        Some("stale_generation")
    } else if state.device_fault.is_some() {
        Some("device_fault")
    } else if !state.phase.accepts_scans() {
        Some("busy")
    } else {
        None
    }
}

impl Reducer for ScanReducer {
    type State = ScanState;
    type Action = ScanAction;
    type Environment = ScanEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Decoded: guard, then extract and validate
            // ═══════════════════════════════════════════════════════════════
            ScanAction::Decoded { generation, event } => match event {
                DecodeEvent::Payload(raw) => Self::on_payload(state, generation, raw, env),
                DecodeEvent::NoCode => smallvec![Effect::None],
                DecodeEvent::Fault(fault) => {
                    if generation == state.generation {
                        Self::record_fault(state, fault);
                    } else {
                        tracing::debug!(%fault, generation, "Ignoring fault from a released session");
                    }
                    smallvec![Effect::None]
                },
            },

            // ═══════════════════════════════════════════════════════════════
            // Resolved: apply only to the resolution still in progress
            // ═══════════════════════════════════════════════════════════════
            ScanAction::Resolved {
                generation,
                subject,
                outcome,
            } => {
                if state.phase == Phase::Resolving && generation == state.generation {
                    Self::complete(state, subject, outcome, env);
                } else {
                    tracing::debug!(
                        generation,
                        current_generation = state.generation,
                        phase = ?state.phase,
                        status = %outcome.status(),
                        "Discarding stale outcome"
                    );
                    metrics::counter!("scanner.outcomes.discarded").increment(1);
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // Dismiss: operator acknowledged the outcome
            // ═══════════════════════════════════════════════════════════════
            ScanAction::Dismiss => {
                if state.phase == Phase::Showing {
                    Self::begin_reset(state, env)
                } else {
                    tracing::debug!(phase = ?state.phase, "Dismiss ignored");
                    smallvec![Effect::None]
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // ForceReset: abandon the scan; an in-flight outcome is discarded
            // ═══════════════════════════════════════════════════════════════
            ScanAction::ForceReset => match state.phase {
                Phase::Resolving | Phase::Showing => {
                    tracing::info!(phase = ?state.phase, "Scan reset by operator");
                    Self::begin_reset(state, env)
                },
                Phase::Idle | Phase::Resetting => smallvec![Effect::None],
            },

            // ═══════════════════════════════════════════════════════════════
            // SettleElapsed: re-arm under a new generation
            // ═══════════════════════════════════════════════════════════════
            ScanAction::SettleElapsed { generation } => {
                if state.phase == Phase::Resetting && generation == state.generation {
                    state.generation += 1;
                    state.phase = Phase::Idle;
                    tracing::debug!(generation = state.generation, "Scanner re-armed");
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // DeviceFailed: the decoder could not be acquired
            // ═══════════════════════════════════════════════════════════════
            ScanAction::DeviceFailed { fault } => {
                Self::record_fault(state, fault);
                smallvec![Effect::None]
            },
        }
    }
}
