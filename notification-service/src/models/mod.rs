//! Notification row and the offer projections the templates render.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Dispatch state of a notification row. Rows are inserted as pending and
/// move to sent or failed exactly once; there is no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => NotificationStatus::Sent,
            "failed" => NotificationStatus::Failed,
            _ => NotificationStatus::Pending,
        }
    }
}

/// One dispatched (or attempted) email.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRecord {
    pub notification_id: Uuid,
    pub channel: String,
    pub template: String,
    pub status: String,
    pub recipient: String,
    pub subject: String,
    pub offer_id: Option<Uuid>,
    pub has_attachment: bool,
    pub provider_id: Option<String>,
    pub error_message: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub sent_utc: Option<DateTime<Utc>>,
    pub failed_utc: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// A fresh pending row, before any dispatch attempt.
    pub fn pending(
        template: &str,
        recipient: &str,
        subject: &str,
        offer_id: Option<Uuid>,
        has_attachment: bool,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4(),
            channel: "email".to_string(),
            template: template.to_string(),
            status: NotificationStatus::Pending.as_str().to_string(),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            offer_id,
            has_attachment,
            provider_id: None,
            error_message: None,
            created_utc: Utc::now(),
            sent_utc: None,
            failed_utc: None,
        }
    }
}

/// The slice of an offer the email templates need.
#[derive(Debug, Clone, FromRow)]
pub struct OfferEmail {
    pub offer_id: Uuid,
    pub company_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub amount: Decimal,
    pub monthly_payment: Decimal,
    pub signed_at: Option<DateTime<Utc>>,
    pub signer_name: Option<String>,
}

impl OfferEmail {
    pub fn is_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// One equipment line as rendered in the offer emails.
#[derive(Debug, Clone, FromRow)]
pub struct OfferEquipmentLine {
    pub title: String,
    pub quantity: i32,
    pub monthly_payment_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in [
            NotificationStatus::Pending,
            NotificationStatus::Sent,
            NotificationStatus::Failed,
        ] {
            assert_eq!(NotificationStatus::from_string(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_falls_back_to_pending() {
        assert_eq!(
            NotificationStatus::from_string("queued"),
            NotificationStatus::Pending
        );
    }

    #[test]
    fn pending_rows_start_without_dispatch_timestamps() {
        let record = NotificationRecord::pending("generic", "a@b.example", "Hello", None, false);
        assert_eq!(record.status, "pending");
        assert_eq!(record.channel, "email");
        assert!(record.sent_utc.is_none());
        assert!(record.failed_utc.is_none());
        assert!(record.provider_id.is_none());
    }
}
