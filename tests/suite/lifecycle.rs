//! Status transitions and cancellation

use std::time::Duration;

use mockfetch_source::{FetchError, FetchStatus};

use crate::common::{run_for, seeded, users_source};

#[tokio::test(start_paused = true)]
async fn cancel_before_delay_wins_for_any_probability() {
    let source = users_source();

    for p in [0.0, 0.5, 1.0] {
        let mut handle = source.fetch(&seeded(10, p, 1)).unwrap();
        assert!(handle.cancel());
        assert_eq!(handle.outcome().await, Err(FetchError::Cancelled));
        assert_eq!(handle.status(), FetchStatus::Cancelled);

        // Nothing left to fire can move the status.
        run_for(20).await;
        assert_eq!(handle.status(), FetchStatus::Cancelled);
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent() {
    let source = users_source();
    let handle = source.fetch(&seeded(10, 0.0, 1)).unwrap();

    assert!(handle.cancel());
    assert!(!handle.cancel());
    assert!(!handle.canceller().cancel());
    assert_eq!(handle.status(), FetchStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn cancel_in_same_tick_as_elapsed_timer_wins() {
    let source = users_source();

    // Zero delay: the timer is already due, but the completion task has not
    // been polled because this task has not yielded yet.
    let mut handle = source.fetch(&seeded(0, 0.0, 1)).unwrap();
    assert!(handle.cancel());
    assert_eq!(handle.outcome().await, Err(FetchError::Cancelled));

    run_for(5).await;
    assert_eq!(handle.status(), FetchStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_observed_outcome_is_noop() {
    let source = users_source();
    let mut handle = source.fetch(&seeded(10, 0.0, 1)).unwrap();

    let delivered = handle.outcome().await;
    assert!(delivered.is_ok());

    assert!(!handle.cancel());
    assert_eq!(handle.status(), FetchStatus::Resolved);
    assert_eq!(handle.outcome().await, delivered);
}

#[tokio::test(start_paused = true)]
async fn rejected_request_stays_rejected() {
    let source = users_source();
    let mut handle = source.fetch(&seeded(10, 1.0, 1)).unwrap();

    assert_eq!(handle.outcome().await, Err(FetchError::SimulatedFailure));
    assert!(!handle.cancel());
    run_for(50).await;
    assert_eq!(handle.status(), FetchStatus::Rejected);
}

#[tokio::test(start_paused = true)]
async fn completion_that_already_fired_is_not_overridden() {
    let source = users_source();
    let mut handle = source.fetch(&seeded(10, 0.0, 1)).unwrap();

    // Timer fires while nobody is awaiting.
    run_for(20).await;
    assert_eq!(handle.status(), FetchStatus::Resolved);

    assert!(!handle.cancel());
    assert_eq!(handle.outcome().await.unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancel_from_another_task_while_awaiting() {
    let source = users_source();
    let mut handle = source.fetch(&seeded(50, 0.0, 1)).unwrap();
    let canceller = handle.canceller();

    let cancel_task = tokio::spawn(async move {
        run_for(5).await;
        canceller.cancel()
    });

    assert_eq!(handle.outcome().await, Err(FetchError::Cancelled));
    assert!(cancel_task.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn in_flight_requests_are_independent() {
    let source = users_source();
    let mut first = source.fetch(&seeded(10, 0.0, 1)).unwrap();
    let mut second = source.fetch(&seeded(10, 0.0, 1)).unwrap();

    assert!(first.cancel());

    assert!(second.outcome().await.is_ok());
    assert_eq!(first.outcome().await, Err(FetchError::Cancelled));
    assert_eq!(second.status(), FetchStatus::Resolved);
}

#[tokio::test(start_paused = true)]
async fn dropped_handle_does_not_disturb_others() {
    let source = users_source();
    drop(source.fetch(&seeded(10, 0.0, 1)).unwrap());

    let mut handle = source.fetch(&seeded(10, 0.0, 2)).unwrap();
    assert!(handle.outcome().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn deadline_shorter_than_delay_times_out() {
    let source = users_source();
    let mut handle = source.fetch(&seeded(100, 0.0, 1)).unwrap();

    let outcome = handle.outcome_within(Duration::from_millis(10)).await;
    assert_eq!(outcome, Err(FetchError::Timeout));
    assert_eq!(handle.status(), FetchStatus::Cancelled);

    run_for(200).await;
    assert_eq!(handle.status(), FetchStatus::Cancelled);
    assert_eq!(handle.outcome().await, Err(FetchError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn deadline_longer_than_delay_returns_outcome() {
    let source = users_source();
    let mut handle = source.fetch(&seeded(10, 0.0, 1)).unwrap();

    let outcome = handle.outcome_within(Duration::from_millis(100)).await;
    assert_eq!(outcome.unwrap().len(), 3);
    assert_eq!(handle.status(), FetchStatus::Resolved);
}

#[tokio::test(start_paused = true)]
async fn every_request_reaches_exactly_one_terminal_state() {
    let source = users_source();

    for seed in 0..16 {
        let mut handle = source.fetch(&seeded(10, 0.5, seed)).unwrap();
        assert_eq!(handle.status(), FetchStatus::Pending);

        let outcome = handle.outcome().await;
        let status = handle.status();
        match outcome {
            Ok(_) => assert_eq!(status, FetchStatus::Resolved),
            Err(FetchError::SimulatedFailure) => assert_eq!(status, FetchStatus::Rejected),
            Err(other) => panic!("unexpected outcome {other:?}"),
        }

        assert!(!handle.cancel());
        run_for(20).await;
        assert_eq!(handle.status(), status);
    }
}
