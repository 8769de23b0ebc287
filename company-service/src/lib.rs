//! company-service: tenant company registry, derived subscription status,
//! branding themes and catalog API key issuance.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod subscription;
