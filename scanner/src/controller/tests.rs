//! Single-transition tests for the scan reducer.

#![allow(clippy::unwrap_used, clippy::panic)] // Test code can unwrap/panic

use super::*;
use crate::auth::StaticCredential;
use crate::authority::InMemoryAuthority;
use crate::decoder::{DecodeEvent, DeviceFault};
use crate::types::{Credential, HistoryEntry, VerificationOutcome, VerificationStatus};
use std::sync::Arc;
use std::time::Duration;
use tixscan_core::{effect::Effect, reducer::Reducer};
use tixscan_testing::{ReducerTest, assertions, mocks::epoch, test_clock};

const TOKEN: &str = "686b52a51f85f2ba7bf56f36";

fn env() -> ScanEnvironment {
    ScanEnvironment::new(
        Arc::new(InMemoryAuthority::seeded(Arc::new(test_clock()))),
        Arc::new(StaticCredential::new(Credential::new("organizer-session-token"))),
        Arc::new(test_clock()),
    )
}

fn signed_out_env() -> ScanEnvironment {
    ScanEnvironment {
        credentials: Arc::new(StaticCredential::none()),
        ..env()
    }
}

fn payload(generation: u64, raw: &str) -> ScanAction {
    ScanAction::Decoded {
        generation,
        event: DecodeEvent::Payload(raw.to_string()),
    }
}

fn state_in(phase: Phase) -> ScanState {
    ScanState {
        phase,
        outcome: (phase == Phase::Showing).then(VerificationOutcome::malformed),
        ..ScanState::default()
    }
}

fn entry(subject: &str) -> HistoryEntry {
    HistoryEntry {
        outcome: VerificationOutcome::malformed(),
        subject: subject.to_string(),
        scanned_at: epoch(),
    }
}

#[test]
fn payload_in_idle_starts_resolution() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState::new())
        .when_action(payload(0, TOKEN))
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Resolving);
            assert!(state.outcome.is_none());
            assert!(state.history.is_empty());
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assertions::assert_has_future_effect(effects);
        })
        .run();
}

#[test]
fn malformed_payload_resolves_locally() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState::new())
        .when_action(payload(0, "not-a-real-code"))
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Showing);
            let outcome = state.outcome.as_ref().unwrap();
            assert_eq!(outcome.status(), VerificationStatus::Invalid);
            assert_eq!(outcome.message(), VerificationOutcome::MALFORMED);

            let latest = state.history.latest().unwrap();
            assert_eq!(latest.subject, "not-a-real-code");
            assert_eq!(latest.scanned_at, epoch());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn missing_credential_is_an_immediate_error() {
    ReducerTest::new(ScanReducer::new())
        .with_env(signed_out_env())
        .given_state(ScanState::new())
        .when_action(payload(0, TOKEN))
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Showing);
            let outcome = state.outcome.as_ref().unwrap();
            assert_eq!(outcome.status(), VerificationStatus::Error);
            assert_eq!(outcome.message(), VerificationOutcome::SIGNED_OUT);
            assert_eq!(state.history.latest().unwrap().subject, TOKEN);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn guard_drops_payloads_outside_idle() {
    for phase in [Phase::Resolving, Phase::Showing, Phase::Resetting] {
        let before = state_in(phase);
        let expected = before.clone();
        ReducerTest::new(ScanReducer::new())
            .with_env(env())
            .given_state(before)
            .when_action(payload(0, TOKEN))
            .then_state(move |state| assert_eq!(state, &expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}

#[test]
fn blank_payloads_are_ignored() {
    for raw in ["", "   ", "\n\t"] {
        ReducerTest::new(ScanReducer::new())
            .with_env(env())
            .given_state(ScanState::new())
            .when_action(payload(0, raw))
            .then_state(|state| assert_eq!(state, &ScanState::new()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}

#[test]
fn stale_generation_payload_is_ignored() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState {
            generation: 3,
            ..ScanState::new()
        })
        .when_action(payload(2, TOKEN))
        .then_state(|state| assert_eq!(state.phase, Phase::Idle))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn no_code_is_silent() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState::new())
        .when_action(ScanAction::Decoded {
            generation: 0,
            event: DecodeEvent::NoCode,
        })
        .then_state(|state| assert_eq!(state, &ScanState::new()))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn resolved_moves_to_showing_and_records_history() {
    let outcome = VerificationOutcome::invalid(VerificationOutcome::NOT_FOUND);
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState {
            history: {
                let mut history = crate::types::ScanHistory::new();
                history.record(entry("older"));
                history
            },
            ..state_in(Phase::Resolving)
        })
        .when_action(ScanAction::Resolved {
            generation: 0,
            subject: "ffffffffffffffffffffffff".to_string(),
            outcome: outcome.clone(),
        })
        .then_state(move |state| {
            assert_eq!(state.phase, Phase::Showing);
            assert_eq!(state.outcome.as_ref(), Some(&outcome));
            let subjects: Vec<_> = state.history.iter().map(|e| e.subject.as_str()).collect();
            assert_eq!(subjects, vec!["ffffffffffffffffffffffff", "older"]);
        })
        .run();
}

#[test]
fn resolved_under_old_generation_is_discarded() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState {
            generation: 1,
            ..state_in(Phase::Resolving)
        })
        .when_action(ScanAction::Resolved {
            generation: 0,
            subject: TOKEN.to_string(),
            outcome: VerificationOutcome::valid(VerificationOutcome::ENTRY_ALLOWED, None),
        })
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Resolving);
            assert!(state.history.is_empty());
        })
        .run();
}

#[test]
fn resolved_while_resetting_is_discarded() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(state_in(Phase::Resetting))
        .when_action(ScanAction::Resolved {
            generation: 0,
            subject: TOKEN.to_string(),
            outcome: VerificationOutcome::valid(VerificationOutcome::ENTRY_ALLOWED, None),
        })
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Resetting);
            assert!(state.outcome.is_none());
            assert!(state.history.is_empty());
        })
        .run();
}

#[test]
fn dismiss_schedules_settle() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env().with_settle_delay(Duration::from_millis(250)))
        .given_state(state_in(Phase::Showing))
        .when_action(ScanAction::Dismiss)
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Resetting);
            assert!(state.outcome.is_none());
        })
        .then_effects(|effects| {
            assert!(matches!(
                effects,
                [Effect::Delay { duration, .. }] if *duration == Duration::from_millis(250)
            ));
            assert_eq!(
                assertions::assert_has_delay_effect(effects),
                &ScanAction::SettleElapsed { generation: 0 }
            );
        })
        .run();
}

#[test]
fn dismiss_outside_showing_is_ignored() {
    for phase in [Phase::Idle, Phase::Resolving, Phase::Resetting] {
        ReducerTest::new(ScanReducer::new())
            .with_env(env())
            .given_state(state_in(phase))
            .when_action(ScanAction::Dismiss)
            .then_state(move |state| assert_eq!(state.phase, phase))
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}

#[test]
fn settle_rearms_with_next_generation() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState {
            generation: 4,
            ..state_in(Phase::Resetting)
        })
        .when_action(ScanAction::SettleElapsed { generation: 4 })
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Idle);
            assert_eq!(state.generation, 5);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn duplicate_settle_is_ignored() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(state_in(Phase::Resetting))
        .when_action(ScanAction::SettleElapsed { generation: 0 })
        .when_action(ScanAction::SettleElapsed { generation: 0 })
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Idle);
            assert_eq!(state.generation, 1);
        })
        .run();
}

#[test]
fn force_reset_while_resolving_discards_late_outcome() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(state_in(Phase::Resolving))
        .when_action(ScanAction::ForceReset)
        .when_action(ScanAction::Resolved {
            generation: 0,
            subject: TOKEN.to_string(),
            outcome: VerificationOutcome::valid(VerificationOutcome::ENTRY_ALLOWED, None),
        })
        .when_action(ScanAction::SettleElapsed { generation: 0 })
        .then_state(|state| {
            assert_eq!(state.phase, Phase::Idle);
            assert_eq!(state.generation, 1);
            assert!(state.outcome.is_none());
            assert!(state.history.is_empty());
        })
        .run();
}

#[test]
fn force_reset_in_idle_is_a_no_op() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState::new())
        .when_action(ScanAction::ForceReset)
        .then_state(|state| assert_eq!(state, &ScanState::new()))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn device_fault_disables_scanning() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState::new())
        .when_action(ScanAction::DeviceFailed {
            fault: DeviceFault::PermissionDenied,
        })
        .when_action(payload(0, TOKEN))
        .then_state(|state| {
            assert_eq!(state.device_fault, Some(DeviceFault::PermissionDenied));
            assert_eq!(state.phase, Phase::Idle);
            assert!(!state.is_armed_for(0));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn first_fault_is_kept() {
    ReducerTest::new(ScanReducer::new())
        .with_env(env())
        .given_state(ScanState::new())
        .when_action(ScanAction::Decoded {
            generation: 0,
            event: DecodeEvent::Fault(DeviceFault::NoCamera),
        })
        .when_action(ScanAction::DeviceFailed {
            fault: DeviceFault::Busy,
        })
        .then_state(|state| assert_eq!(state.device_fault, Some(DeviceFault::NoCamera)))
        .run();
}

#[tokio::test]
async fn resolution_effect_calls_the_authority_once() {
    let authority = Arc::new(InMemoryAuthority::seeded(Arc::new(test_clock())));
    let env = ScanEnvironment {
        authority: authority.clone(),
        ..env()
    };
    let mut state = ScanState::new();

    let effects = ScanReducer::new().reduce(&mut state, payload(0, TOKEN), &env);
    let mut effects = effects.into_iter();
    let Some(Effect::Future(fut)) = effects.next() else {
        panic!("expected a future effect");
    };

    let action = fut.await.unwrap();
    assert_eq!(authority.calls(), 1);
    match action {
        ScanAction::Resolved {
            generation,
            subject,
            outcome,
        } => {
            assert_eq!(generation, 0);
            assert_eq!(subject, TOKEN);
            assert_eq!(outcome.status(), VerificationStatus::Valid);
        },
        other => panic!("unexpected action {other:?}"),
    }
}

/// Authority whose consume future panics
struct PanickingAuthority;

impl crate::authority::TicketAuthority for PanickingAuthority {
    fn consume(
        &self,
        _identifier: crate::types::Identifier,
        _credential: Credential,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = VerificationOutcome> + Send + '_>> {
        Box::pin(async { panic!("authority exploded") })
    }
}

#[tokio::test]
async fn panicking_authority_still_resolves() {
    let env = ScanEnvironment {
        authority: Arc::new(PanickingAuthority),
        ..env()
    };
    let mut state = ScanState::new();

    let effects = ScanReducer::new().reduce(&mut state, payload(0, TOKEN), &env);
    let Some(Effect::Future(fut)) = effects.into_iter().next() else {
        panic!("expected a future effect");
    };

    let action = fut.await.unwrap();
    assert_eq!(
        action,
        ScanAction::Resolved {
            generation: 0,
            subject: TOKEN.to_string(),
            outcome: VerificationOutcome::error(VerificationOutcome::UNEXPECTED),
        }
    );

    ScanReducer::new().reduce(&mut state, action, &env);
    assert_eq!(state.phase, Phase::Showing);
    assert_eq!(state.history.len(), 1);
}
