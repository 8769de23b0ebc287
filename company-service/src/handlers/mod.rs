//! HTTP handlers for company-service.

pub mod api_keys;
pub mod branding;
pub mod companies;
