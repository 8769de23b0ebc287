//! notification-service: transactional email for the leasing platform.
//! Renders offer lifecycle mails, dispatches them through a pluggable
//! provider and keeps a notification row per dispatch.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod templates;
