//! Category and brand models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Product category. `name` is the stable machine name, `label` the display
/// string; `co2_savings_kg` is the per-unit saving shown on every product in
/// the category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub label: String,
    pub co2_savings_kg: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Brand {
    pub brand_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub label: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}
