//! Subscription derivation integration tests for company-service.

mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::json;

async fn create_company_with_dates(
    app: &TestApp,
    slug: &str,
    trial_ends_at: Option<chrono::DateTime<Utc>>,
    subscription_ends_at: Option<chrono::DateTime<Utc>>,
) -> String {
    let body: serde_json::Value = app
        .client()
        .post(format!("{}/companies", app.address))
        .json(&json!({
            "name": "Test Tenant",
            "slug": slug,
            "trial_ends_at": trial_ends_at.map(|d| d.to_rfc3339()),
            "subscription_ends_at": subscription_ends_at.map(|d| d.to_rfc3339()),
        }))
        .send()
        .await
        .expect("Failed to create company")
        .json()
        .await
        .expect("Failed to parse response");

    body["company_id"].as_str().unwrap().to_string()
}

async fn subscription_of(app: &TestApp, company_id: &str) -> serde_json::Value {
    app.client()
        .get(format!(
            "{}/companies/{}/subscription",
            app.address, company_id
        ))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn company_in_trial_reports_trial() {
    let app = TestApp::spawn().await;

    let company_id =
        create_company_with_dates(&app, "in-trial", Some(Utc::now() + Duration::days(5)), None)
            .await;

    let view = subscription_of(&app, &company_id).await;
    assert_eq!(view["status"], "trial");
    assert_eq!(view["expires_soon"], false);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn deactivation_wins_over_a_running_trial() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = create_company_with_dates(
        &app,
        "cancelled-mid-trial",
        Some(Utc::now() + Duration::days(10)),
        None,
    )
    .await;

    client
        .post(format!("{}/companies/{}/deactivate", app.address, company_id))
        .send()
        .await
        .expect("Failed to deactivate");

    let view = subscription_of(&app, &company_id).await;
    assert_eq!(view["status"], "cancelled");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn lapsed_subscription_reports_expired() {
    let app = TestApp::spawn().await;

    let company_id = create_company_with_dates(
        &app,
        "lapsed",
        None,
        Some(Utc::now() - Duration::days(1)),
    )
    .await;

    let view = subscription_of(&app, &company_id).await;
    assert_eq!(view["status"], "expired");
    assert_eq!(view["expires_soon"], false);
    assert!(view["days_remaining"].is_null());

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn subscription_ending_this_week_is_active_and_expiring_soon() {
    let app = TestApp::spawn().await;

    // The extra hour keeps whole-day truncation away from the boundary.
    let company_id = create_company_with_dates(
        &app,
        "ending-soon",
        None,
        Some(Utc::now() + Duration::days(3) + Duration::hours(1)),
    )
    .await;

    let view = subscription_of(&app, &company_id).await;
    assert_eq!(view["status"], "active");
    assert_eq!(view["expires_soon"], true);
    assert_eq!(view["days_remaining"], 3);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn clearing_the_trial_date_moves_the_company_to_active() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = create_company_with_dates(
        &app,
        "trial-ended-early",
        Some(Utc::now() + Duration::days(5)),
        None,
    )
    .await;

    // Explicit null clears the date
    let response = client
        .post(format!(
            "{}/companies/{}/subscription",
            app.address, company_id
        ))
        .json(&json!({ "trial_ends_at": null }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);

    let view: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(view["status"], "active");
    assert!(view["trial_ends_at"].is_null());

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn period_update_can_extend_a_subscription() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = create_company_with_dates(
        &app,
        "renewed",
        None,
        Some(Utc::now() - Duration::days(1)),
    )
    .await;

    let view = subscription_of(&app, &company_id).await;
    assert_eq!(view["status"], "expired");

    let response = client
        .post(format!(
            "{}/companies/{}/subscription",
            app.address, company_id
        ))
        .json(&json!({
            "subscription_ends_at": (Utc::now() + Duration::days(365)).to_rfc3339(),
            "plan": "pro"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    let view: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(view["status"], "active");
    assert_eq!(view["plan"], "pro");
    assert_eq!(view["expires_soon"], false);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn subscription_of_unknown_company_is_not_found() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .get(format!(
            "{}/companies/{}/subscription",
            app.address,
            uuid::Uuid::new_v4()
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
