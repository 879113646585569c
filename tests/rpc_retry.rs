//! Retry behaviour of the RPC client against a flaky mock ledger.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use contract_caller::blockchain::{ClientError, TxStatus};

mod common;

#[tokio::test]
async fn test_two_failures_then_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let mock = common::start_mock_rpc(move |_| {
        if cc.fetch_add(1, Ordering::SeqCst) < 2 {
            (503, "Service Unavailable".into())
        } else {
            (200, r#"{"nonce": 5, "balance_raw": "1000000"}"#.into())
        }
    })
    .await;

    let client = common::client(&mock, 3);
    let balance = client.balance("octA").await.expect("should succeed on third attempt");

    assert_eq!(balance.nonce, 5);
    assert_eq!(balance.raw, 1_000_000);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_persistent_failure_exhausts_bound() {
    let mock = common::start_mock_rpc(|_| (500, "boom".into())).await;

    let client = common::client(&mock, 3);
    let err = client.get("/balance/octA").await.unwrap_err();

    match err {
        ClientError::RpcUnavailable { url, attempts, status, last_error } => {
            assert_eq!(url, format!("{}/balance/octA", mock.endpoint()));
            assert_eq!(attempts, 3);
            assert_eq!(status, Some(500));
            assert!(last_error.contains("boom"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(mock.requests().len(), 3);
}

#[tokio::test]
async fn test_malformed_body_is_not_retried() {
    let mock = common::start_mock_rpc(|_| (200, "<html>maintenance</html>".into())).await;

    let client = common::client(&mock, 3);
    let err = client.get("/balance/octA").await.unwrap_err();

    assert!(matches!(err, ClientError::MalformedResponse { .. }));
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn test_submission_is_attempted_once() {
    let mock = common::start_mock_rpc(|_| (503, "busy".into())).await;

    let client = common::client(&mock, 3);
    let err = client
        .submit("/call-contract", &serde_json::json!({"nonce": 6}))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::RpcUnavailable { attempts: 1, .. }));
    assert_eq!(mock.requests_to("/call-contract").len(), 1);
}

#[tokio::test]
async fn test_view_post_is_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let mock = common::start_mock_rpc(move |_| {
        if cc.fetch_add(1, Ordering::SeqCst) == 0 {
            (502, "bad gateway".into())
        } else {
            (200, r#"{"status": "success", "result": "42"}"#.into())
        }
    })
    .await;

    let client = common::client(&mock, 3);
    let body = client
        .post("/contract/call-view", &serde_json::json!({"method": "get"}))
        .await
        .unwrap();

    assert_eq!(body["result"], "42");
    let requests = mock.requests_to("/contract/call-view");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[1].json()["method"], "get");
}

#[tokio::test]
async fn test_unknown_wallet() {
    let mock = common::start_mock_rpc(|_| (404, r#"{"error": "not found"}"#.into())).await;

    let client = common::client(&mock, 2);
    let err = client.balance("octGhost").await.unwrap_err();

    assert!(matches!(err, ClientError::WalletNotFound { ref address } if address == "octGhost"));
}

#[tokio::test]
async fn test_wallet_not_found_in_body() {
    let mock = common::start_mock_rpc(|_| (200, r#"{"error": "Sender not found"}"#.into())).await;

    let client = common::client(&mock, 3);
    let err = client.nonce("octGhost").await.unwrap_err();

    assert!(matches!(err, ClientError::WalletNotFound { .. }));
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn test_float_balance_does_not_block_nonce() {
    let mock = common::start_mock_rpc(|_| (200, r#"{"nonce": 5, "balance_raw": 2500000.0}"#.into())).await;

    let client = common::client(&mock, 1);
    assert_eq!(client.nonce("octA").await.unwrap(), 5);

    let balance = client.balance("octA").await.unwrap();
    assert_eq!(balance.raw, 2_500_000);
    assert_eq!(balance.amount(), 2.5);
}

#[tokio::test]
async fn test_tx_status_mapping() {
    let mock = common::start_mock_rpc(|req| match req.path.as_str() {
        "/tx/pending" => (200, r#"{"status": "pending"}"#.into()),
        "/tx/done" => (200, r#"{"status": "confirmed"}"#.into()),
        "/tx/odd" => (200, r#"{"status": "dropped"}"#.into()),
        _ => (404, "{}".into()),
    })
    .await;

    let client = common::client(&mock, 1);
    assert_eq!(client.tx_status("pending").await.unwrap(), TxStatus::Pending);
    assert_eq!(client.tx_status("done").await.unwrap(), TxStatus::Confirmed);
    assert_eq!(
        client.tx_status("odd").await.unwrap(),
        TxStatus::Unknown("dropped".to_string())
    );
    assert_eq!(client.tx_status("missing").await.unwrap(), TxStatus::NotFound);
}
