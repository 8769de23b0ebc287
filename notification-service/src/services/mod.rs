//! Services module for notification-service.
//!
//! Contains the email providers, database access and metrics collection.

pub mod database;
pub mod metrics;
pub mod providers;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use providers::{
    EmailAttachment, EmailMessage, EmailProvider, MockEmailProvider, ProviderError,
    ProviderResponse, SmtpProvider,
};
