//! Catalog API key integration tests for company-service.

mod common;

use common::TestApp;
use serde_json::json;
use sha2::{Digest, Sha256};

async fn create_company(app: &TestApp, slug: &str) -> String {
    let body: serde_json::Value = app
        .client()
        .post(format!("{}/companies", app.address))
        .json(&json!({ "name": "Test Tenant", "slug": slug }))
        .send()
        .await
        .expect("Failed to create company")
        .json()
        .await
        .expect("Failed to parse response");

    body["company_id"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn issuing_a_key_returns_the_plaintext_once() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = create_company(&app, "itakecare").await;

    let response = client
        .post(format!("{}/companies/{}/api-keys", app.address, company_id))
        .json(&json!({ "name": "storefront" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);

    let issued: serde_json::Value = response.json().await.expect("Failed to parse response");
    let api_key = issued["api_key"].as_str().unwrap();
    assert!(api_key.starts_with("lzr_"));
    assert_eq!(issued["name"], "storefront");
    assert_eq!(issued["key_prefix"], &api_key[..12]);

    // Only the SHA-256 digest is stored
    let stored_digest: String =
        sqlx::query_scalar("SELECT key_digest FROM api_keys WHERE key_id = $1")
            .bind(uuid::Uuid::parse_str(issued["key_id"].as_str().unwrap()).unwrap())
            .fetch_one(app.db.pool())
            .await
            .expect("Failed to read stored key");

    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    assert_eq!(stored_digest, hex::encode(hasher.finalize()));
    assert_ne!(stored_digest, api_key);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn listing_keys_never_reveals_the_key() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = create_company(&app, "itakecare").await;

    client
        .post(format!("{}/companies/{}/api-keys", app.address, company_id))
        .json(&json!({ "name": "storefront" }))
        .send()
        .await
        .expect("Failed to issue key");

    let keys: Vec<serde_json::Value> = client
        .get(format!("{}/companies/{}/api-keys", app.address, company_id))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["name"], "storefront");
    assert_eq!(keys[0]["key_prefix"].as_str().unwrap().len(), 12);
    assert!(keys[0].get("api_key").is_none());
    assert!(keys[0].get("key_digest").is_none());

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn revoking_a_key_removes_it() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = create_company(&app, "itakecare").await;

    let issued: serde_json::Value = client
        .post(format!("{}/companies/{}/api-keys", app.address, company_id))
        .json(&json!({ "name": "storefront" }))
        .send()
        .await
        .expect("Failed to issue key")
        .json()
        .await
        .expect("Failed to parse response");

    let key_id = issued["key_id"].as_str().unwrap();

    let revoke = client
        .delete(format!(
            "{}/companies/{}/api-keys/{}",
            app.address, company_id, key_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(revoke.status(), 204);

    let again = client
        .delete(format!(
            "{}/companies/{}/api-keys/{}",
            app.address, company_id, key_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(again.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn issuing_for_an_unknown_company_is_not_found() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(format!(
            "{}/companies/{}/api-keys",
            app.address,
            uuid::Uuid::new_v4()
        ))
        .json(&json!({ "name": "storefront" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
