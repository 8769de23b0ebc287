//! Request middleware for offer-service.

pub mod tenant;

pub use tenant::CompanyContext;
