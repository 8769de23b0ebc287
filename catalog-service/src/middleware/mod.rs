//! Middleware for catalog-service.

pub mod api_key;

pub use api_key::{digest_key, require_api_key};
