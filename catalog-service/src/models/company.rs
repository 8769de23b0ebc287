//! Company-facing catalog models: public profile, presentation settings,
//! customizations and the environmental report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Public profile of the company behind a catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyProfile {
    pub company_id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
}

/// Presentation settings for the public catalog. One row per company;
/// readers get defaults when none exists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CatalogSettings {
    pub company_id: Uuid,
    pub header_enabled: bool,
    pub header_title: Option<String>,
    pub header_description: Option<String>,
    pub show_prices: bool,
    pub show_co2_savings: bool,
    pub items_per_page: i32,
    pub updated_utc: DateTime<Utc>,
}

impl CatalogSettings {
    /// Defaults served when a company has not customized anything yet.
    pub fn default_for(company_id: Uuid) -> Self {
        Self {
            company_id,
            header_enabled: true,
            header_title: None,
            header_description: None,
            show_prices: true,
            show_co2_savings: true,
            items_per_page: 24,
            updated_utc: Utc::now(),
        }
    }
}

/// Catalog-specific overrides of the company identity. Falls back to the
/// company profile when no row exists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyCustomizations {
    pub company_id: Uuid,
    pub catalog_name: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub welcome_text: Option<String>,
    pub updated_utc: DateTime<Utc>,
}

impl CompanyCustomizations {
    /// Derive a customization view from the company profile.
    pub fn from_profile(profile: &CompanyProfile) -> Self {
        Self {
            company_id: profile.company_id,
            catalog_name: Some(profile.name.clone()),
            logo_url: profile.logo_url.clone(),
            primary_color: profile.primary_color.clone(),
            secondary_color: profile.secondary_color.clone(),
            accent_color: profile.accent_color.clone(),
            welcome_text: None,
            updated_utc: Utc::now(),
        }
    }
}

/// One category's contribution to the environmental report.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryImpact {
    pub name: String,
    pub label: String,
    pub product_count: i64,
    pub co2_savings_kg_per_unit: Decimal,
    pub total_co2_savings_kg: Decimal,
}

/// Company-level CO2 aggregate across active catalog products.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentalReport {
    pub company_id: Uuid,
    pub total_products: i64,
    pub total_co2_savings_kg: Decimal,
    pub source: String,
    pub categories: Vec<CategoryImpact>,
}
