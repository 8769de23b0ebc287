//! Company model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Tenant company. Subscription status is derived from `is_active` and the
/// two end timestamps on every read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub company_id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub plan: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub modules_enabled: Vec<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Company {
    /// Theme object handed to renderers. Callers receive it per tenant
    /// instead of reading shared mutable style state.
    pub fn branding(&self) -> CompanyBranding {
        CompanyBranding {
            company_id: self.company_id,
            logo_url: self.logo_url.clone(),
            primary_color: self.primary_color.clone(),
            secondary_color: self.secondary_color.clone(),
            accent_color: self.accent_color.clone(),
        }
    }
}

/// Per-tenant branding theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyBranding {
    pub company_id: Uuid,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
}

/// Input for registering a company.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCompany {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 2, max = 64, message = "Slug must be 2 to 64 characters"))]
    pub slug: String,
    #[serde(default = "default_plan")]
    pub plan: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modules_enabled: Vec<String>,
}

fn default_plan() -> String {
    "starter".to_string()
}

/// Input for updating a company's core fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompany {
    pub name: Option<String>,
    #[validate(length(min = 2, max = 64, message = "Slug must be 2 to 64 characters"))]
    pub slug: Option<String>,
    pub plan: Option<String>,
}

/// Input for moving the trial or subscription period. Explicit nulls clear a
/// date; omitted fields leave it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriptionPeriod {
    #[serde(default, with = "double_option")]
    pub trial_ends_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "double_option")]
    pub subscription_ends_at: Option<Option<DateTime<Utc>>>,
    pub plan: Option<String>,
}

/// Input for replacing the enabled-modules list.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateModules {
    pub modules_enabled: Vec<String>,
}

/// Input for updating the branding theme.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBranding {
    #[validate(url(message = "Invalid logo URL"))]
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
}

/// Distinguishes "field absent" from "field explicitly null".
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// True when the slug is usable in URLs and subdomains.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// True when the value is a `#RRGGBB` hex color.
pub fn is_valid_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}
