//! Services module for payment-service.
//!
//! Contains the provider client, database access and metrics collection.

pub mod database;
pub mod direct_debit;
pub mod metrics;

pub use database::Database;
pub use direct_debit::DirectDebitClient;
pub use metrics::{get_metrics, init_metrics};
