//! Data models for company-service.

pub mod api_key;
pub mod company;

pub use api_key::{ApiKey, CreateApiKey, IssuedApiKey};
pub use company::{
    is_valid_color, is_valid_slug, Company, CompanyBranding, CreateCompany, UpdateBranding,
    UpdateCompany, UpdateModules, UpdateSubscriptionPeriod,
};
