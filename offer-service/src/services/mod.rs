//! Services module for offer-service.
//!
//! Contains database access and metrics collection.

pub mod database;
pub mod metrics;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
