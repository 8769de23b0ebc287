//! Pack model. A pack bundles products at a single monthly price.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pack {
    pub pack_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub monthly_price: Decimal,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Pack line with its product resolved for display.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PackItem {
    pub pack_item_id: Uuid,
    pub pack_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image_url: Option<String>,
    pub quantity: i32,
}

/// Pack with its items, returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PackDetail {
    #[serde(flatten)]
    pub pack: Pack,
    pub items: Vec<PackItem>,
}
