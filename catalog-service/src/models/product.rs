//! Product model.
//!
//! Rows come back with brand and category names already resolved; the public
//! API never exposes bare foreign keys without their display names.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog product. `attributes` and `specifications` are open-ended
/// key/value maps whose key order is author-defined and must survive
/// storage, hence `IndexMap` in a `json` column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub price: Decimal,
    pub monthly_price: Decimal,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub attributes: Json<IndexMap<String, String>>,
    pub specifications: Json<IndexMap<String, String>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// One purchasable attribute combination of a product.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VariantPrice {
    pub variant_price_id: Uuid,
    pub product_id: Uuid,
    pub attributes: Json<IndexMap<String, String>>,
    pub price: Decimal,
    pub monthly_price: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Per-category CO2 saving attributed to a product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCo2 {
    pub product_id: Uuid,
    pub category_name: Option<String>,
    pub co2_savings_kg: Decimal,
    pub source: String,
}

/// Where the per-category CO2 figures come from.
pub const CO2_SOURCE: &str = "impactco2.fr";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_attributes_keep_insertion_order() {
        let json = r#"{
            "product_id": "7b52009b-64fd-4a3f-a3a6-7b52009b64fd",
            "company_id": "11111111-1111-1111-1111-111111111111",
            "name": "MacBook Air 13",
            "description": null,
            "brand_id": null,
            "brand_name": null,
            "category_id": null,
            "category_name": null,
            "price": "749.00",
            "monthly_price": "24.50",
            "image_url": null,
            "is_active": true,
            "attributes": {"RAM": "16GB", "Disque": "512GB", "Couleur": "Argent"},
            "specifications": {},
            "created_utc": "2025-01-01T00:00:00Z",
            "updated_utc": "2025-01-01T00:00:00Z"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = product.attributes.0.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["RAM", "Disque", "Couleur"]);

        let out = serde_json::to_string(&product).unwrap();
        let ram = out.find("\"RAM\"").unwrap();
        let disque = out.find("\"Disque\"").unwrap();
        let couleur = out.find("\"Couleur\"").unwrap();
        assert!(ram < disque && disque < couleur);
    }
}
