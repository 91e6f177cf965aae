/// End-to-end HTTP tests against a server bound to an ephemeral port
mod common;

use common::{FakeBackend, TestServer, FUNDED_ADDRESS};
use serde_json::Value;

#[tokio::test]
async fn test_balance_endpoint_success() {
    let server = TestServer::start(FakeBackend::returning(1000)).await.unwrap();

    let response = server
        .get(&format!("/eth/balance/{}", FUNDED_ADDRESS))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["balance"], "1000");
    assert_eq!(server.metrics.successes(), 1);
}

#[tokio::test]
async fn test_balance_endpoint_invalid_address() {
    let backend = FakeBackend::returning(1000);
    let server = TestServer::start(backend.clone()).await.unwrap();

    let response = server.get("/eth/balance/not-an-address").await.unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(backend.calls(), 0);
    assert_eq!(server.metrics.errors(), 1);
}

#[tokio::test]
async fn test_balance_endpoint_backend_failure() {
    let server = TestServer::start(FakeBackend::failing("node unreachable"))
        .await
        .unwrap();

    let response = server
        .get(&format!("/eth/balance/{}", FUNDED_ADDRESS))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "internal error");
    assert_eq!(server.metrics.errors(), 1);
    assert_eq!(server.metrics.successes(), 0);
}

#[tokio::test]
async fn test_probes() {
    let server = TestServer::start(FakeBackend::returning(1)).await.unwrap();
    assert_eq!(server.get("/live").await.unwrap().status(), 200);
    assert_eq!(server.get("/ready").await.unwrap().status(), 200);
    assert_eq!(server.metrics.total(), 0);

    let broke = TestServer::start(FakeBackend::returning(0)).await.unwrap();
    assert_eq!(broke.get("/live").await.unwrap().status(), 503);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = TestServer::start(FakeBackend::returning(1)).await.unwrap();
    server
        .get(&format!("/eth/balance/{}", FUNDED_ADDRESS))
        .await
        .unwrap();
    server.get("/eth/balance/bad").await.unwrap();

    let response = server.get("/metrics").await.unwrap();
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(text.contains("requests_total 2"));
    assert!(text.contains("requests_ok_total 1"));
    assert!(text.contains("requests_err_total 1"));
    assert!(text.contains("route=\"/eth/balance/:addr\""));
}
