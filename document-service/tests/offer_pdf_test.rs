mod common;

use common::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn rendering_returns_pdf_bytes_with_a_download_filename() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = app.seed_company("iTakecare", Some("#33638E")).await;
    let client_id = app
        .seed_client(company_id, "Anna Durand", "anna@acme.example")
        .await;
    let offer_id = app
        .seed_offer(company_id, Some(client_id), "Anna Durand", "anna@acme.example")
        .await;
    app.seed_equipment(offer_id, "MacBook Pro 14", 2, "1200", "76.00")
        .await;
    app.seed_equipment(offer_id, "Dock USB-C", 2, "180", "11.40")
        .await;

    let response = client
        .post(format!("{}/documents/offer-pdf", app.address))
        .json(&json!({ "offer_id": offer_id }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .expect("Missing content-disposition")
        .to_string();
    assert!(disposition.contains(&format!("offre-{}.pdf", offer_id)));

    let bytes = response.bytes().await.expect("Failed to read body");
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 1500);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn an_unknown_offer_is_404() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(format!("{}/documents/offer-pdf", app.address))
        .json(&json!({ "offer_id": Uuid::new_v4() }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Offer not found");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn an_offer_without_client_or_company_rows_still_renders() {
    let app = TestApp::spawn().await;
    let client = app.client();

    // No company row, no client row: the document falls back to the
    // snapshot on the offer and the platform branding.
    let offer_id = app
        .seed_offer(Uuid::new_v4(), None, "Anna Durand", "anna@acme.example")
        .await;

    let response = client
        .post(format!("{}/documents/offer-pdf", app.address))
        .json(&json!({ "offer_id": offer_id }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let bytes = response.bytes().await.expect("Failed to read body");
    assert!(bytes.starts_with(b"%PDF"));

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn a_company_without_branding_uses_platform_defaults() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = app.seed_company("Durand Leasing", None).await;
    let offer_id = app
        .seed_offer(company_id, None, "Anna Durand", "anna@acme.example")
        .await;
    app.seed_equipment(offer_id, "Écran 27\"", 1, "300", "9.50")
        .await;

    let response = client
        .post(format!("{}/documents/offer-pdf", app.address))
        .json(&json!({ "offer_id": offer_id }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let bytes = response.bytes().await.expect("Failed to read body");
    assert!(bytes.starts_with(b"%PDF"));

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn a_long_equipment_list_produces_a_larger_document() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let company_id = app.seed_company("iTakecare", Some("#33638E")).await;

    let small_offer = app
        .seed_offer(company_id, None, "Anna Durand", "anna@acme.example")
        .await;
    app.seed_equipment(small_offer, "Poste de travail", 1, "800", "24.50")
        .await;

    let large_offer = app
        .seed_offer(company_id, None, "Anna Durand", "anna@acme.example")
        .await;
    for i in 0..40 {
        app.seed_equipment(
            large_offer,
            &format!("Poste de travail {}", i),
            1,
            "800",
            "24.50",
        )
        .await;
    }

    let small = client
        .post(format!("{}/documents/offer-pdf", app.address))
        .json(&json!({ "offer_id": small_offer }))
        .send()
        .await
        .expect("Failed to execute request")
        .bytes()
        .await
        .expect("Failed to read body");

    let large = client
        .post(format!("{}/documents/offer-pdf", app.address))
        .json(&json!({ "offer_id": large_offer }))
        .send()
        .await
        .expect("Failed to execute request")
        .bytes()
        .await
        .expect("Failed to read body");

    assert!(large.starts_with(b"%PDF"));
    assert!(
        large.len() > small.len(),
        "expected the 40-line document ({} bytes) to outgrow the 1-line one ({} bytes)",
        large.len(),
        small.len()
    );

    app.cleanup().await;
}
