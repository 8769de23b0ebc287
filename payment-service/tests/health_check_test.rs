mod common;

use common::TestApp;
use wiremock::MockServer;

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn health_check_works() {
    let provider = MockServer::start().await;
    let app = TestApp::spawn(&provider.uri(), &provider.uri()).await;
    let client = app.client();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "payment-service");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn readiness_check_works() {
    let provider = MockServer::start().await;
    let app = TestApp::spawn(&provider.uri(), &provider.uri()).await;
    let client = app.client();

    let response = client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn metrics_endpoint_works() {
    let provider = MockServer::start().await;
    let app = TestApp::spawn(&provider.uri(), &provider.uri()).await;
    let client = app.client();

    let response = client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("payment_db_query_duration_seconds"));

    app.cleanup().await;
}
