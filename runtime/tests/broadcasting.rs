//! Integration tests for Store action broadcasting
//!
//! Observers see every action produced by effects, in the order effects
//! complete, before the store reduces it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::time::Duration;
use tixscan_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use tixscan_runtime::{Store, StoreError};

#[derive(Debug, Clone, PartialEq)]
enum LookupAction {
    /// Start a chained lookup with correlation id
    Start { id: u64 },
    /// One hop finished
    Hop { id: u64, step: u32 },
    /// Terminal action
    Finished { id: u64 },
}

#[derive(Debug, Clone, Default)]
struct LookupState {
    hops: Vec<u32>,
    finished: Vec<u64>,
}

#[derive(Clone)]
struct LookupReducer;

impl Reducer for LookupReducer {
    type State = LookupState;
    type Action = LookupAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            LookupAction::Start { id } => smallvec![Effect::future(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                LookupAction::Hop { id, step: 1 }
            })],
            LookupAction::Hop { id, step } => {
                state.hops.push(step);
                if step < 3 {
                    smallvec![Effect::future(async move {
                        LookupAction::Hop { id, step: step + 1 }
                    })]
                } else {
                    smallvec![Effect::future(async move { LookupAction::Finished { id } })]
                }
            },
            LookupAction::Finished { id } => {
                state.finished.push(id);
                smallvec![Effect::None]
            },
        }
    }
}

fn store() -> Store<LookupState, LookupAction, (), LookupReducer> {
    Store::new(LookupState::default(), LookupReducer, ())
}

#[tokio::test]
async fn observers_receive_feedback_actions_in_order() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(LookupAction::Start { id: 7 }).await.unwrap();

    let mut seen = Vec::new();
    loop {
        let action = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for broadcast")
            .expect("broadcast closed");
        let done = matches!(action, LookupAction::Finished { .. });
        seen.push(action);
        if done {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            LookupAction::Hop { id: 7, step: 1 },
            LookupAction::Hop { id: 7, step: 2 },
            LookupAction::Hop { id: 7, step: 3 },
            LookupAction::Finished { id: 7 },
        ]
    );
}

#[tokio::test]
async fn initial_action_is_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(LookupAction::Finished { id: 1 }).await.unwrap();

    let result = tokio::time::timeout(Duration::from_millis(30), rx.recv()).await;
    assert!(result.is_err(), "directly sent actions stay off the broadcast");
}

#[tokio::test]
async fn send_and_wait_for_terminal_action() -> Result<(), StoreError> {
    let store = store();

    let terminal = store
        .send_and_wait_for(
            LookupAction::Start { id: 42 },
            |a| matches!(a, LookupAction::Finished { id: 42 }),
            Duration::from_secs(1),
        )
        .await?;

    assert_eq!(terminal, LookupAction::Finished { id: 42 });
    // The terminal action is broadcast before it is reduced
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.state(|s| s.hops.clone()).await, vec![1, 2, 3]);
    assert_eq!(store.state(|s| s.finished.clone()).await, vec![42]);
    Ok(())
}

#[tokio::test]
async fn shutdown_waits_for_running_effects() -> Result<(), StoreError> {
    let store = store();
    store.send(LookupAction::Start { id: 3 }).await?;

    store.shutdown(Duration::from_secs(1)).await?;
    assert!(store.is_shutting_down());
    Ok(())
}
