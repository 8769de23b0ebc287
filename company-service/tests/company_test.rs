//! Company registry integration tests for company-service.

mod common;

use common::TestApp;
use serde_json::json;

async fn create_company(app: &TestApp, name: &str, slug: &str) -> serde_json::Value {
    app.client()
        .post(format!("{}/companies", app.address))
        .json(&json!({ "name": name, "slug": slug }))
        .send()
        .await
        .expect("Failed to create company")
        .json()
        .await
        .expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn create_company_works() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(format!("{}/companies", app.address))
        .json(&json!({
            "name": "iTakecare",
            "slug": "itakecare",
            "plan": "pro",
            "modules_enabled": ["offers", "catalog"]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body.get("company_id").is_some());
    assert_eq!(body["name"], "iTakecare");
    assert_eq!(body["slug"], "itakecare");
    assert_eq!(body["plan"], "pro");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["modules_enabled"], json!(["offers", "catalog"]));

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn create_company_defaults_plan_to_starter() {
    let app = TestApp::spawn().await;

    let body = create_company(&app, "Acme Leasing", "acme-leasing").await;
    assert_eq!(body["plan"], "starter");
    assert_eq!(body["modules_enabled"], json!([]));

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn duplicate_slug_conflicts() {
    let app = TestApp::spawn().await;
    let client = app.client();

    create_company(&app, "First", "acme").await;

    let response = client
        .post(format!("{}/companies", app.address))
        .json(&json!({ "name": "Second", "slug": "acme" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn malformed_slug_is_rejected() {
    let app = TestApp::spawn().await;
    let client = app.client();

    for slug in ["Acme", "acme leasing", "-acme", "acme-"] {
        let response = client
            .post(format!("{}/companies", app.address))
            .json(&json!({ "name": "Acme", "slug": slug }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), 400, "slug {:?} should be rejected", slug);
    }

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn list_companies_filters_by_slug() {
    let app = TestApp::spawn().await;
    let client = app.client();

    create_company(&app, "iTakecare", "itakecare").await;
    create_company(&app, "Acme Leasing", "acme-leasing").await;

    let filtered: Vec<serde_json::Value> = client
        .get(format!("{}/companies?slug=acme-leasing", app.address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["name"], "Acme Leasing");

    let all: Vec<serde_json::Value> = client
        .get(format!("{}/companies", app.address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(all.len(), 2);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn update_company_changes_only_provided_fields() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let created = create_company(&app, "iTakecare", "itakecare").await;
    let company_id = created["company_id"].as_str().unwrap();

    let response = client
        .patch(format!("{}/companies/{}", app.address, company_id))
        .json(&json!({ "plan": "enterprise" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["plan"], "enterprise");
    assert_eq!(body["name"], "iTakecare");
    assert_eq!(body["slug"], "itakecare");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn deactivate_then_activate_flips_the_flag() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let created = create_company(&app, "iTakecare", "itakecare").await;
    let company_id = created["company_id"].as_str().unwrap();

    let deactivated: serde_json::Value = client
        .post(format!("{}/companies/{}/deactivate", app.address, company_id))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(deactivated["is_active"], false);

    let activated: serde_json::Value = client
        .post(format!("{}/companies/{}/activate", app.address, company_id))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(activated["is_active"], true);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn update_modules_replaces_the_list() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let created = create_company(&app, "iTakecare", "itakecare").await;
    let company_id = created["company_id"].as_str().unwrap();

    let response = client
        .post(format!("{}/companies/{}/modules", app.address, company_id))
        .json(&json!({ "modules_enabled": ["offers", "contracts", "catalog"] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["modules_enabled"],
        json!(["offers", "contracts", "catalog"])
    );

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn delete_company_then_get_returns_not_found() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let created = create_company(&app, "iTakecare", "itakecare").await;
    let company_id = created["company_id"].as_str().unwrap();

    let delete_response = client
        .delete(format!("{}/companies/{}", app.address, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(delete_response.status(), 204);

    let get_response = client
        .get(format!("{}/companies/{}", app.address, company_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(get_response.status(), 404);

    app.cleanup().await;
}
