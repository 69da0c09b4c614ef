//! Integration tests for Store effect execution and action broadcasting

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use event_builder_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use event_builder_runtime::{Store, StoreError};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Start async work that reports back with `Finished`
    Start { id: u64, delay_ms: u64 },
    /// Result of `Start`
    Finished { id: u64 },
    /// Future that produces nothing
    Silent,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    finished: Vec<u64>,
}

struct TestEnvironment;

struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Start { id, delay_ms } => smallvec![Effect::future(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Some(TestAction::Finished { id })
            })],
            TestAction::Finished { id } => {
                state.finished.push(id);
                SmallVec::new()
            },
            TestAction::Silent => smallvec![Effect::future(async { None })],
        }
    }
}

fn test_store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(TestState::default(), TestReducer, TestEnvironment)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn handle_waits_for_feedback_to_be_reduced() {
    let store = test_store();

    let mut handle = store
        .send(TestAction::Start { id: 1, delay_ms: 10 })
        .await
        .unwrap();
    handle.wait().await;

    let finished = store.state(|s| s.finished.clone()).await;
    assert_eq!(finished, vec![1]);
    assert_eq!(handle.pending(), 0);
}

#[tokio::test]
async fn send_and_wait_for_returns_matching_action_after_reduce() {
    let store = test_store();

    let result = store
        .send_and_wait_for(
            TestAction::Start { id: 7, delay_ms: 5 },
            |a| matches!(a, TestAction::Finished { id: 7 }),
            Some(Duration::from_secs(1)),
        )
        .await
        .unwrap();

    assert_eq!(result, TestAction::Finished { id: 7 });
    // The broadcast happens after the reducer ran
    assert!(store.state(|s| s.finished.contains(&7)).await);
}

#[tokio::test]
async fn send_and_wait_for_ignores_other_requests() {
    let store = test_store();

    let slow = store.clone();
    let background = tokio::spawn(async move {
        slow.send_and_wait_for(
            TestAction::Start { id: 1, delay_ms: 60 },
            |a| matches!(a, TestAction::Finished { id: 1 }),
            None,
        )
        .await
    });

    let fast = store
        .send_and_wait_for(
            TestAction::Start { id: 2, delay_ms: 5 },
            |a| matches!(a, TestAction::Finished { id: 2 }),
            None,
        )
        .await
        .unwrap();
    assert_eq!(fast, TestAction::Finished { id: 2 });

    let slow = background.await.unwrap().unwrap();
    assert_eq!(slow, TestAction::Finished { id: 1 });
    assert_eq!(store.state(|s| s.finished.clone()).await, vec![2, 1]);
}

#[tokio::test]
async fn send_and_wait_for_times_out() {
    let store = test_store();

    let result = store
        .send_and_wait_for(
            TestAction::Silent,
            |a| matches!(a, TestAction::Finished { .. }),
            Some(Duration::from_millis(50)),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
    assert_eq!(store.waiting().await, 0);
}

#[tokio::test]
async fn waiters_outnumbering_the_broadcast_buffer_all_complete() {
    let store = test_store();
    // Never drained, so the broadcast overflows
    let _idle = store.subscribe_actions();

    let callers: Vec<_> = (0..200_u64)
        .map(|id| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .send_and_wait_for(
                        TestAction::Start { id, delay_ms: 0 },
                        move |a| matches!(a, TestAction::Finished { id: done } if *done == id),
                        Some(Duration::from_secs(2)),
                    )
                    .await
            })
        })
        .collect();

    for (id, caller) in (0..200_u64).zip(callers) {
        assert_eq!(caller.await.unwrap(), Ok(TestAction::Finished { id }));
    }
    assert_eq!(store.state(|s| s.finished.len()).await, 200);
    assert_eq!(store.waiting().await, 0);
}

#[tokio::test]
async fn timed_out_call_still_lands_and_later_calls_complete() {
    let store = test_store();

    let late = store
        .send_and_wait_for(
            TestAction::Start { id: 1, delay_ms: 100 },
            |a| matches!(a, TestAction::Finished { id: 1 }),
            Some(Duration::from_millis(10)),
        )
        .await;
    assert_eq!(late, Err(StoreError::Timeout));

    let next = store
        .send_and_wait_for(
            TestAction::Start { id: 2, delay_ms: 150 },
            |a| matches!(a, TestAction::Finished { id: 2 }),
            None,
        )
        .await;
    assert_eq!(next, Ok(TestAction::Finished { id: 2 }));
    // The timed-out call still landed in state
    assert_eq!(store.state(|s| s.finished.clone()).await, vec![1, 2]);
}

#[tokio::test]
async fn subscribers_see_effect_actions_only() {
    let store = test_store();
    let mut rx = store.subscribe_actions();

    let mut handle = store
        .send(TestAction::Start { id: 9, delay_ms: 1 })
        .await
        .unwrap();
    handle.wait().await;

    assert_eq!(rx.recv().await.unwrap(), TestAction::Finished { id: 9 });
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn shutdown_waits_then_rejects() {
    let store = test_store();

    store
        .send(TestAction::Start { id: 4, delay_ms: 30 })
        .await
        .unwrap();
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(store.pending_effects(), 0);
    // In-flight feedback still lands after shutdown began
    assert_eq!(store.state(|s| s.finished.clone()).await, vec![4]);
    let rejected = store.send(TestAction::Silent).await;
    assert!(matches!(rejected, Err(StoreError::ShutdownInProgress)));
}

#[tokio::test]
async fn shutdown_times_out_with_running_effects() {
    let store = test_store();

    store
        .send(TestAction::Start { id: 5, delay_ms: 500 })
        .await
        .unwrap();
    let result = store.shutdown(Duration::from_millis(20)).await;

    assert_eq!(result, Err(StoreError::ShutdownTimeout(1)));
}
