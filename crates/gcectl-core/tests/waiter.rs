//! Operation waiter behaviour against the in-memory control plane

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gcectl_core::compute::{OperationErrorDetail, OperationState};
use gcectl_core::{
    CoreError, OperationHandle, OperationScope, ProgressEvent, WaitOptions, wait_for_operation,
};
use support::{Call, FakeCompute, ZONE};
use tokio_util::sync::CancellationToken;

fn fast() -> WaitOptions {
    WaitOptions::default().with_interval(Duration::from_secs(1))
}

#[tokio::test(start_paused = true)]
async fn zonal_operation_polled_until_done() {
    let fake = FakeCompute::new();
    let op = fake.operation(Some(ZONE), 3, None);

    let status = wait_for_operation(&fake, &op.handle(), &fast()).await.unwrap();

    assert_eq!(status.state, OperationState::Done);
    assert!(status.error_detail.is_none());
    assert_eq!(fake.count_calls(|c| matches!(c, Call::ZonePoll(_))), 4);
    assert_eq!(fake.count_calls(|c| matches!(c, Call::GlobalPoll(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn global_operation_routed_to_global_endpoint() {
    let fake = FakeCompute::new();
    let op = fake.operation(None, 2, None);
    assert_eq!(op.handle().scope, OperationScope::Global);

    wait_for_operation(&fake, &op.handle(), &fast()).await.unwrap();

    assert_eq!(fake.count_calls(|c| matches!(c, Call::GlobalPoll(_))), 3);
    assert_eq!(fake.count_calls(|c| matches!(c, Call::ZonePoll(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn wrong_scope_surfaces_not_found() {
    let fake = FakeCompute::new();
    let op = fake.operation(Some(ZONE), 0, None);

    let err = wait_for_operation(&fake, &OperationHandle::global(op.name), &fast())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn done_with_error_is_operation_failed() {
    let fake = FakeCompute::new();
    let op = fake.operation(
        Some(ZONE),
        1,
        Some(OperationErrorDetail::single(
            "ZONE_RESOURCE_POOL_EXHAUSTED",
            "The zone does not have enough resources",
        )),
    );

    let err = wait_for_operation(&fake, &op.handle(), &fast())
        .await
        .unwrap_err();

    match err {
        CoreError::OperationFailed { operation, detail } => {
            assert_eq!(operation, op.name);
            assert_eq!(detail.errors[0].code, "ZONE_RESOURCE_POOL_EXHAUSTED");
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn deadline_yields_timed_out() {
    let fake = FakeCompute::new();
    let op = fake.operation(Some(ZONE), 1_000, None);
    let options = fast().with_timeout(Duration::from_secs(5));

    let start = tokio::time::Instant::now();
    let err = wait_for_operation(&fake, &op.handle(), &options)
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn deadline_shorter_than_interval_is_respected() {
    let fake = FakeCompute::new();
    let op = fake.operation(Some(ZONE), 1_000, None);
    let options = WaitOptions::default()
        .with_interval(Duration::from_secs(10))
        .with_timeout(Duration::from_secs(3));

    let start = tokio::time::Instant::now();
    let err = wait_for_operation(&fake, &op.handle(), &options)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_the_wait() {
    let fake = FakeCompute::new();
    let op = fake.operation(Some(ZONE), 1_000, None);
    let token = CancellationToken::new();
    let options = fast().with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        token.cancel();
    });

    let err = wait_for_operation(&fake, &op.handle(), &options)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(fake.count_calls(|c| matches!(c, Call::ZonePoll(_))), 4);
}

#[tokio::test(start_paused = true)]
async fn transient_poll_failure_propagates_from_waiter() {
    let fake = FakeCompute::new().with_transient_polls(1);
    let op = fake.operation(Some(ZONE), 0, None);

    let err = wait_for_operation(&fake, &op.handle(), &fast())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(!err.is_operation_failed());
}

#[tokio::test(start_paused = true)]
async fn progress_events_bracket_the_polls() {
    let fake = FakeCompute::new();
    let op = fake.operation(Some(ZONE), 2, None);

    let events = Arc::new(Mutex::new(Vec::<ProgressEvent>::new()));
    let sink = events.clone();
    let options = fast().with_progress(Arc::new(move |event: ProgressEvent| {
        sink.lock().unwrap().push(event);
    }));

    wait_for_operation(&fake, &op.handle(), &options).await.unwrap();

    let events = events.lock().unwrap();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
    let states: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Polling { state, .. } => Some(state.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec!["RUNNING", "RUNNING", "DONE"]);
}
