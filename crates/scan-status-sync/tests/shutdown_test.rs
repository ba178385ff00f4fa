/*
[INPUT]:  Deactivation and drop scenarios
[OUTPUT]: Teardown safety verification
[POS]:    Integration test layer - clean exit verification
[UPDATE]: When changing shutdown logic
*/

mod common;

use std::time::Duration;

use common::{FakeConnector, FakeLister, config, service_with, settle, task, task_status_frame, wait_until};
use scan_status_adapter::{Credential, CredentialSource, StreamEvent};
use scan_status_sync::{IndicatorState, SessionPhase, SyncMode};
use tokio::time::sleep;

/// Test: Nothing reaches the snapshot after deactivate returns
#[tokio::test(start_paused = true)]
async fn test_deactivate_silences_stream() {
    let connector = FakeConnector::new();
    let credentials = CredentialSource::with_initial(Some(Credential::new("token-a")));
    let mut service = service_with(
        config(SyncMode::Stream),
        &connector,
        &FakeLister::new(),
        &credentials,
    );
    let mut indicator_rx = service.subscribe_indicator();

    service.activate();
    let stream = connector.wait_for_connections(1).await;
    stream.push_frame(task_status_frame(&["running"])).await;
    wait_until(&mut indicator_rx, |state| *state == IndicatorState::Running).await;

    service.deactivate().await;
    assert!(!service.is_active());
    assert!(stream.is_closed());
    assert_eq!(service.indicator(), IndicatorState::Idle);
    assert!(service.snapshot().is_empty());
    assert_eq!(service.phase(), SessionPhase::Idle);

    let mut snapshot_rx = service.subscribe_snapshot();
    assert!(!stream.push_frame(task_status_frame(&["failed"])).await);
    credentials.set(Credential::new("token-b"));
    sleep(Duration::from_secs(60)).await;

    assert!(!snapshot_rx.has_changed().unwrap());
    assert_eq!(service.indicator(), IndicatorState::Idle);
    assert_eq!(connector.connections(), 1);
}

/// Test: Deactivating during backoff cancels the reconnect timer
#[tokio::test(start_paused = true)]
async fn test_deactivate_during_backoff_cancels_reconnect() {
    let connector = FakeConnector::new();
    let credentials = CredentialSource::with_initial(Some(Credential::new("token-a")));
    let mut service = service_with(
        config(SyncMode::Stream),
        &connector,
        &FakeLister::new(),
        &credentials,
    );
    let mut error_rx = service.subscribe_last_error();

    service.activate();
    let stream = connector.wait_for_connections(1).await;
    stream.push(StreamEvent::Failed("refused".to_string())).await;
    wait_until(&mut error_rx, Option::is_some).await;
    assert_eq!(service.phase(), SessionPhase::Backoff);

    service.deactivate().await;
    assert_eq!(service.last_error(), None);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.connections(), 1);
    assert_eq!(service.phase(), SessionPhase::Idle);
}

/// Test: An in-flight poll completing after deactivate is discarded
#[tokio::test(start_paused = true)]
async fn test_deactivate_discards_in_flight_fetch() {
    let connector = FakeConnector::new();
    let lister = FakeLister::gated();
    lister.push_ok(vec![task(1, "failed")]);
    let credentials = CredentialSource::with_initial(Some(Credential::new("token-a")));
    let mut service = service_with(config(SyncMode::Poll), &connector, &lister, &credentials);

    service.activate();
    settle().await;
    assert_eq!(lister.calls(), 1);

    service.deactivate().await;
    lister.release(10);
    sleep(Duration::from_secs(60)).await;

    assert_eq!(lister.calls(), 1);
    assert!(service.snapshot().is_empty());
    assert_eq!(service.indicator(), IndicatorState::Idle);
}

/// Test: Dropping the service stops its worker and closes the session
#[tokio::test(start_paused = true)]
async fn test_drop_closes_session() {
    let connector = FakeConnector::new();
    let credentials = CredentialSource::with_initial(Some(Credential::new("token-a")));
    let mut service = service_with(
        config(SyncMode::Stream),
        &connector,
        &FakeLister::new(),
        &credentials,
    );

    service.activate();
    let stream = connector.wait_for_connections(1).await;
    drop(service);
    settle().await;

    assert!(stream.is_closed());
    assert!(!stream.push_frame(task_status_frame(&["running"])).await);
}

/// Test: A deactivated service can be activated again with a fresh session
#[tokio::test(start_paused = true)]
async fn test_reactivate_opens_fresh_session() {
    let connector = FakeConnector::new();
    let credentials = CredentialSource::with_initial(Some(Credential::new("token-a")));
    let mut service = service_with(
        config(SyncMode::Stream),
        &connector,
        &FakeLister::new(),
        &credentials,
    );
    let mut indicator_rx = service.subscribe_indicator();

    assert!(service.activate());
    let first = connector.wait_for_connections(1).await;
    service.deactivate().await;

    assert!(service.activate());
    let second = connector.wait_for_connections(2).await;
    assert!(first.is_closed());
    assert!(second.prior_closed);

    second.push_frame(task_status_frame(&["completed"])).await;
    wait_until(&mut indicator_rx, |state| *state == IndicatorState::Completed).await;
    service.deactivate().await;
}
