//! offer-service: offers, contracts, equipment lines, collaborators and the
//! equipment assignment registry.

pub mod config;
pub mod finance;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod wizard;
