//! catalog-service: the public per-company catalog API, gated by per-company
//! API keys. Read-only; catalog content is managed out of band.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
