//! HTTP handlers for notification-service.

pub mod emails;
pub mod notifications;
