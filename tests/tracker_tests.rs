//! Unit tests for submission and status tracking (service::tracker module)

use std::time::{Duration, Instant};
use wallet_core::config::PartialStatusPolicy;
use wallet_core::types::{OperationState, OperationStatus, SignedOperation};
use wallet_core::{cancel_pair, StatusTracker, WalletError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::{
    fast_poll_options, intent_response, status_json, test_client, DUMMY_OPERATION_SET_ID,
    FAR_FUTURE_EXPIRY, PAST_EXPIRY,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn status_path() -> String {
    format!("/v1/operations/{}/status", DUMMY_OPERATION_SET_ID)
}

fn submit_path() -> String {
    format!("/v1/operations/{}/submit", DUMMY_OPERATION_SET_ID)
}

/// Mount a status response served at most `times` times, ahead of later mounts.
async fn mount_status(server: &MockServer, state: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(status_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json(state)))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

fn signatures(count: u32) -> Vec<SignedOperation> {
    (0..count)
        .map(|index| SignedOperation {
            index,
            signature: format!("0x{:02x}", index),
            signed_typed_data: None,
        })
        .collect()
}

// ============================================================================
// POLLING TESTS
// ============================================================================

/// What is tested: polling reports every status and stops at `successful`
/// Why: The UI shows progress and the final status of the operation set
#[tokio::test]
async fn test_poll_until_successful() {
    let server = MockServer::start().await;
    mount_status(&server, "pending", 1).await;
    mount_status(&server, "processing", 1).await;
    mount_status(&server, "successful", 1).await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );
    let mut seen = Vec::new();
    let mut on_update = |status: &OperationStatus| seen.push(status.status);

    let status = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, Some(&mut on_update), None)
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Successful);
    assert_eq!(status.operation_set_id, DUMMY_OPERATION_SET_ID);
    assert_eq!(
        seen,
        vec![
            OperationState::Pending,
            OperationState::Processing,
            OperationState::Successful
        ]
    );
}

/// What is tested: polling gives up with a timeout after exactly max_attempts fetches
/// Why: A timeout means "unknown outcome" and must not hammer the backend
#[tokio::test]
async fn test_poll_times_out_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(status_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json("pending")))
        .expect(3)
        .mount(&server)
        .await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(3, PartialStatusPolicy::KeepPolling),
    );

    let err = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, None, None)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(
        err,
        WalletError::StatusTimeout { ref operation_set_id, attempts: 3 } if operation_set_id == DUMMY_OPERATION_SET_ID
    ));
    // Dropping the server verifies the fetch count
    drop(server);
}

/// What is tested: `failed` ends polling and reports the failing chains
/// Why: A failed operation set is a definite outcome
#[tokio::test]
async fn test_poll_stops_on_failed() {
    let server = MockServer::start().await;
    mount_status(&server, "processing", 1).await;
    mount_status(&server, "failed", 1).await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );

    let status = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, None, None)
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Failed);
    assert_eq!(status.failed_chains(), vec![1]);
}

/// What is tested: with the default policy `partial` keeps polling
/// Why: The backend may still retry the failed chain
#[tokio::test]
async fn test_partial_keeps_polling_by_default() {
    let server = MockServer::start().await;
    mount_status(&server, "partial", 2).await;
    mount_status(&server, "successful", 1).await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );
    let mut updates = 0;
    let mut on_update = |_: &OperationStatus| updates += 1;

    let status = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, Some(&mut on_update), None)
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Successful);
    assert_eq!(updates, 3);
}

/// What is tested: with the terminal policy `partial` is returned immediately
/// Why: Deployments that treat per-chain results as final must not wait
#[tokio::test]
async fn test_partial_is_terminal_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(status_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_json("partial")))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::Terminal),
    );

    let status = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, None, None)
        .await
        .unwrap();

    assert_eq!(status.status, OperationState::Partial);
    drop(server);
}

/// What is tested: a fetch error ends polling immediately with that error
/// Why: Retrying is the caller's decision
#[tokio::test]
async fn test_poll_propagates_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(status_path()))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );

    let err = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, None, None)
        .await
        .unwrap_err();

    assert_eq!(err.api_error().unwrap().status_code, 500);
    drop(server);
}

/// What is tested: a status answered for a different operation set is refused, even if terminal
/// Why: Reporting another set's success would tell the user the wrong outcome
#[tokio::test]
async fn test_poll_rejects_mismatched_operation_set() {
    let server = MockServer::start().await;
    let mut body = status_json("successful");
    body["operationSetId"] = serde_json::json!("opset-other");
    Mock::given(method("GET"))
        .and(path(status_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );
    let mut updates = 0;
    let mut on_update = |_: &OperationStatus| updates += 1;

    let err = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, Some(&mut on_update), None)
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::InvalidResponse(ref msg) if msg.contains("opset-other")));
    assert_eq!(updates, 0);
    drop(server);
}

/// What is tested: cancelling during the poll interval stops polling promptly
/// Why: A user leaving the status screen must not keep a poll loop alive
#[tokio::test]
async fn test_poll_cancelled_between_attempts() {
    let server = MockServer::start().await;
    mount_status(&server, "pending", 100).await;

    let mut options = fast_poll_options(10, PartialStatusPolicy::KeepPolling);
    options.poll_interval = Duration::from_secs(30);
    let tracker = StatusTracker::new(test_client(&server), options);
    let (handle, signal) = cancel_pair();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();
    });

    let started = Instant::now();
    let err = tracker
        .poll_operation_status(DUMMY_OPERATION_SET_ID, None, Some(&signal))
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
}

// ============================================================================
// SUBMISSION TESTS
// ============================================================================

/// What is tested: a complete signed bundle is submitted under the operation set ID
/// Why: Submission is the hand-off point to the backend
#[tokio::test]
async fn test_submit_complete_bundle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(submit_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );
    let intent = intent_response(2, FAR_FUTURE_EXPIRY);

    tracker
        .submit_signed_operations(&intent, &signatures(2))
        .await
        .unwrap();
    drop(server);
}

/// What is tested: an expired bundle is never submitted
/// Why: The backend rejects late submissions; fail locally with a clear error
#[tokio::test]
async fn test_submit_expired_bundle_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(submit_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );
    let intent = intent_response(1, PAST_EXPIRY);

    let err = tracker
        .submit_signed_operations(&intent, &signatures(1))
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::IntentExpired { .. }));
    drop(server);
}

/// What is tested: a signature list that does not cover the bundle is never submitted
/// Why: Partial signature lists must not reach the backend
#[tokio::test]
async fn test_submit_incomplete_bundle_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(submit_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tracker = StatusTracker::new(
        test_client(&server),
        fast_poll_options(10, PartialStatusPolicy::KeepPolling),
    );
    let intent = intent_response(3, FAR_FUTURE_EXPIRY);

    let err = tracker
        .submit_signed_operations(&intent, &signatures(2))
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::InvalidBundle(_)));
    drop(server);
}
