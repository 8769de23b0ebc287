//! Smoke test to verify workflow-tests infrastructure.

mod common;

/// Verify that the context builds and the services answer their health checks.
#[tokio::test]
#[ignore] // Requires the full service stack
async fn workflow_context_connects_to_services() {
    let ctx = common::setup().await;

    assert!(!ctx.company_id.is_nil());

    let response = ctx
        .http
        .get(format!("{}/health", ctx.endpoints.offer))
        .send()
        .await
        .expect("Failed to reach offer-service");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse health body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "offer-service");
}
