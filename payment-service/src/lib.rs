//! payment-service: direct-debit mandate orchestration. One endpoint sets up
//! a mandate for a contract against the provider API and writes the
//! resulting identifiers back onto the contract row.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
