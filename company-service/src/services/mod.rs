//! Services module for company-service.
//!
//! Contains database access, API key generation and metrics collection.

pub mod database;
pub mod keys;
pub mod metrics;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
