//! Integration tests for product endpoints.
//!
//! Run with: cargo test --test product_test -- --ignored
//! Requires PostgreSQL running via docker-compose.

mod common;

use common::TestApp;
use uuid::Uuid;

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn list_shows_only_active_products() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    app.seed_product(company_id, "MacBook Air", "24.50", None, None, true)
        .await;
    app.seed_product(company_id, "Old ThinkPad", "9.00", None, None, false)
        .await;

    let response = client
        .get(app.catalog_url(company_id, "/products"))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let products: serde_json::Value = response.json().await.expect("Failed to parse response");
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "MacBook Air");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn list_does_not_leak_another_companys_products() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let acme = app.seed_company("Acme Leasing", "acme").await;
    let rival = app.seed_company("Rival Rentals", "rival").await;
    let key = app.issue_key(acme).await;

    app.seed_product(acme, "MacBook Air", "24.50", None, None, true)
        .await;
    app.seed_product(rival, "Surface Pro", "31.00", None, None, true)
        .await;

    let response = client
        .get(app.catalog_url(acme, "/products"))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");

    let products: serde_json::Value = response.json().await.expect("Failed to parse response");
    let names: Vec<&str> = products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["MacBook Air"]);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn get_resolves_brand_and_category_labels() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    let category = app
        .seed_category(company_id, "laptop", "Laptops", "156.00")
        .await;
    let brand = app.seed_brand(company_id, "apple", "Apple").await;
    let product_id = app
        .seed_product(
            company_id,
            "MacBook Air",
            "24.50",
            Some(category),
            Some(brand),
            true,
        )
        .await;

    let response = client
        .get(app.catalog_url(company_id, &format!("/products/{}", product_id)))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let product: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(product["brand_name"], "Apple");
    assert_eq!(product["category_name"], "Laptops");
    assert_eq!(product["monthly_price"], "24.50");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn unknown_product_is_404() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    let response = client
        .get(app.catalog_url(company_id, &format!("/products/{}", Uuid::new_v4())))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn attribute_order_survives_the_round_trip() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    let product_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (product_id, company_id, name, monthly_price, attributes)
         VALUES ($1, $2, $3, $4, $5::json)",
    )
    .bind(product_id)
    .bind(company_id)
    .bind("MacBook Air")
    .bind(rust_decimal::Decimal::new(2450, 2))
    .bind(r#"{"RAM": "16GB", "Disque": "512GB", "Couleur": "Argent"}"#)
    .execute(app.db.pool())
    .await
    .expect("Failed to seed product");

    let response = client
        .get(app.catalog_url(company_id, &format!("/products/{}", product_id)))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.expect("Failed to read response");
    let ram = body.find("\"RAM\"").expect("RAM missing");
    let disque = body.find("\"Disque\"").expect("Disque missing");
    let couleur = body.find("\"Couleur\"").expect("Couleur missing");
    assert!(ram < disque && disque < couleur, "attribute order changed");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn variant_prices_are_listed() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    let product_id = app
        .seed_product(company_id, "MacBook Air", "24.50", None, None, true)
        .await;

    for (attrs, monthly) in [
        (r#"{"RAM": "16GB"}"#, "24.50"),
        (r#"{"RAM": "24GB"}"#, "29.50"),
    ] {
        sqlx::query(
            "INSERT INTO product_variant_prices (variant_price_id, product_id, attributes, monthly_price)
             VALUES ($1, $2, $3::json, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(attrs)
        .bind(monthly.parse::<rust_decimal::Decimal>().unwrap())
        .execute(app.db.pool())
        .await
        .expect("Failed to seed variant");
    }

    let response = client
        .get(app.catalog_url(company_id, &format!("/products/{}/variants", product_id)))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let variants: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(variants.as_array().unwrap().len(), 2);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn related_products_share_the_category() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    let laptops = app
        .seed_category(company_id, "laptop", "Laptops", "156.00")
        .await;
    let phones = app
        .seed_category(company_id, "smartphone", "Smartphones", "45.00")
        .await;

    let macbook = app
        .seed_product(company_id, "MacBook Air", "24.50", Some(laptops), None, true)
        .await;
    app.seed_product(company_id, "ThinkPad X1", "19.00", Some(laptops), None, true)
        .await;
    app.seed_product(
        company_id,
        "Retired Dell",
        "5.00",
        Some(laptops),
        None,
        false,
    )
    .await;
    app.seed_product(company_id, "iPhone 15", "21.00", Some(phones), None, true)
        .await;

    let response = client
        .get(app.catalog_url(company_id, &format!("/products/{}/related", macbook)))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let related: serde_json::Value = response.json().await.expect("Failed to parse response");
    let names: Vec<&str> = related
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ThinkPad X1"]);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn co2_comes_from_the_category() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    let laptops = app
        .seed_category(company_id, "laptop", "Laptops", "156.00")
        .await;
    let macbook = app
        .seed_product(company_id, "MacBook Air", "24.50", Some(laptops), None, true)
        .await;
    let uncategorized = app
        .seed_product(company_id, "Mystery Box", "4.00", None, None, true)
        .await;

    let response = client
        .get(app.catalog_url(company_id, &format!("/products/{}/co2", macbook)))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let co2: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(co2["co2_savings_kg"], "156.00");
    assert_eq!(co2["category_name"], "Laptops");
    assert_eq!(co2["source"], "impactco2.fr");

    // No category means no saving to claim
    let response = client
        .get(app.catalog_url(company_id, &format!("/products/{}/co2", uncategorized)))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let co2: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(co2["co2_savings_kg"], "0");
    assert!(co2["category_name"].is_null());

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn search_matches_name_and_description_case_insensitively() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    app.seed_product(company_id, "MacBook Air", "24.50", None, None, true)
        .await;
    app.seed_product(company_id, "ThinkPad X1", "19.00", None, None, true)
        .await;

    let response = client
        .get(app.catalog_url(company_id, "/search?q=macbook"))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let hits: serde_json::Value = response.json().await.expect("Failed to parse response");
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "MacBook Air");

    // Descriptions match too; the seed helper writes "<name> description"
    let response = client
        .get(app.catalog_url(company_id, "/search?q=thinkpad%20x1%20description"))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");

    let hits: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(hits.as_array().unwrap().len(), 1);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn blank_search_is_rejected() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    let response = client
        .get(app.catalog_url(company_id, "/search?q=%20%20"))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn product_pages_do_not_overlap() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let company_id = app.seed_company("Acme Leasing", "acme").await;
    let key = app.issue_key(company_id).await;

    for name in ["Laptop A", "Laptop B", "Laptop C"] {
        app.seed_product(company_id, name, "10.00", None, None, true)
            .await;
    }

    let response = client
        .get(app.catalog_url(company_id, "/products?page_size=2"))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    let first: serde_json::Value = response.json().await.expect("Failed to parse response");
    let first = first.as_array().unwrap();
    assert_eq!(first.len(), 2);

    let last_id = first[1]["product_id"].as_str().unwrap();
    let response = client
        .get(app.catalog_url(
            company_id,
            &format!("/products?page_size=2&page_token={}", last_id),
        ))
        .header("x-api-key", &key)
        .send()
        .await
        .expect("Failed to execute request");
    let second: serde_json::Value = response.json().await.expect("Failed to parse response");
    let second = second.as_array().unwrap();
    assert_eq!(second.len(), 1);

    let mut seen: Vec<&str> = first
        .iter()
        .chain(second.iter())
        .map(|p| p["product_id"].as_str().unwrap())
        .collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 3);

    app.cleanup().await;
}
