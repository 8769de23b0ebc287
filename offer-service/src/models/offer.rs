//! Offer model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateEquipmentLine, EquipmentLine};

/// Accept/reject decision on an offer, distinct from its workflow position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "accepted" => OfferStatus::Accepted,
            "rejected" => OfferStatus::Rejected,
            _ => OfferStatus::Pending,
        }
    }

    /// Legal transitions: pending is the only non-terminal state.
    pub fn can_transition_to(&self, next: OfferStatus) -> bool {
        matches!(
            (self, next),
            (OfferStatus::Pending, OfferStatus::Accepted)
                | (OfferStatus::Pending, OfferStatus::Rejected)
        )
    }
}

/// Position of an offer in its approval/send pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    Sent,
    Approved,
    LeaserReview,
    Financed,
    Rejected,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Sent => "sent",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::LeaserReview => "leaser_review",
            WorkflowStatus::Financed => "financed",
            WorkflowStatus::Rejected => "rejected",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => WorkflowStatus::Sent,
            "approved" => WorkflowStatus::Approved,
            "leaser_review" => WorkflowStatus::LeaserReview,
            "financed" => WorkflowStatus::Financed,
            "rejected" => WorkflowStatus::Rejected,
            _ => WorkflowStatus::Draft,
        }
    }

    /// Legal forward transitions; financed and rejected are terminal.
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        matches!(
            (self, next),
            (WorkflowStatus::Draft, WorkflowStatus::Sent)
                | (WorkflowStatus::Sent, WorkflowStatus::Approved)
                | (WorkflowStatus::Sent, WorkflowStatus::Rejected)
                | (WorkflowStatus::Approved, WorkflowStatus::LeaserReview)
                | (WorkflowStatus::Approved, WorkflowStatus::Rejected)
                | (WorkflowStatus::LeaserReview, WorkflowStatus::Financed)
                | (WorkflowStatus::LeaserReview, WorkflowStatus::Rejected)
        )
    }
}

/// Origin of an offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    #[default]
    AdminOffer,
    AmbassadorOffer,
    ClientRequest,
    InternalOffer,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::AdminOffer => "admin_offer",
            OfferType::AmbassadorOffer => "ambassador_offer",
            OfferType::ClientRequest => "client_request",
            OfferType::InternalOffer => "internal_offer",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "ambassador_offer" => OfferType::AmbassadorOffer,
            "client_request" => OfferType::ClientRequest,
            "internal_offer" => OfferType::InternalOffer,
            _ => OfferType::AdminOffer,
        }
    }
}

/// Leasing proposal.
///
/// `amount` and `monthly_payment` are independently stored aggregates; they are
/// written when the equipment list is persisted and are not recomputed on read.
/// Once `signed_at` is set the offer is frozen: updates and status transitions
/// are rejected with a conflict.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Offer {
    pub offer_id: Uuid,
    pub company_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub amount: Decimal,
    pub coefficient: Decimal,
    pub monthly_payment: Decimal,
    pub commission: Option<Decimal>,
    pub ambassador_id: Option<Uuid>,
    pub status: String,
    pub workflow_status: String,
    pub offer_type: String,
    pub remarks: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub signer_name: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Offer {
    pub fn is_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// Offer with its equipment lines, the shape returned by the create and
/// detail endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct OfferWithEquipment {
    #[serde(flatten)]
    pub offer: Offer,
    pub equipment: Vec<EquipmentLine>,
}

/// Input for creating an offer together with its equipment lines. The owning
/// company comes from the request context, never from the payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOffer {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub client_email: String,
    pub amount: Decimal,
    pub coefficient: Decimal,
    pub monthly_payment: Decimal,
    pub commission: Option<Decimal>,
    pub ambassador_id: Option<Uuid>,
    #[serde(default)]
    pub offer_type: OfferType,
    pub remarks: Option<String>,
    #[serde(default)]
    pub equipment: Vec<CreateEquipmentLine>,
}

/// Input for updating a pre-signature offer.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOffer {
    pub client_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub client_email: Option<String>,
    pub amount: Option<Decimal>,
    pub coefficient: Option<Decimal>,
    pub monthly_payment: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub remarks: Option<String>,
}

/// Filter parameters for listing offers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListOffersFilter {
    pub client_id: Option<Uuid>,
    pub status: Option<OfferStatus>,
    pub workflow_status: Option<WorkflowStatus>,
    pub offer_type: Option<OfferType>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

impl Default for ListOffersFilter {
    fn default() -> Self {
        Self {
            client_id: None,
            status: None,
            workflow_status: None,
            offer_type: None,
            page_size: 50,
            page_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_accepted_or_rejected() {
        assert!(OfferStatus::Pending.can_transition_to(OfferStatus::Accepted));
        assert!(OfferStatus::Pending.can_transition_to(OfferStatus::Rejected));
    }

    #[test]
    fn accepted_and_rejected_are_terminal() {
        assert!(!OfferStatus::Accepted.can_transition_to(OfferStatus::Rejected));
        assert!(!OfferStatus::Accepted.can_transition_to(OfferStatus::Pending));
        assert!(!OfferStatus::Rejected.can_transition_to(OfferStatus::Accepted));
    }

    #[test]
    fn workflow_follows_the_pipeline_order() {
        assert!(WorkflowStatus::Draft.can_transition_to(WorkflowStatus::Sent));
        assert!(WorkflowStatus::Sent.can_transition_to(WorkflowStatus::Approved));
        assert!(WorkflowStatus::Approved.can_transition_to(WorkflowStatus::LeaserReview));
        assert!(WorkflowStatus::LeaserReview.can_transition_to(WorkflowStatus::Financed));
    }

    #[test]
    fn workflow_cannot_skip_ahead_or_reopen() {
        assert!(!WorkflowStatus::Draft.can_transition_to(WorkflowStatus::Financed));
        assert!(!WorkflowStatus::Draft.can_transition_to(WorkflowStatus::Approved));
        assert!(!WorkflowStatus::Financed.can_transition_to(WorkflowStatus::Draft));
        assert!(!WorkflowStatus::Rejected.can_transition_to(WorkflowStatus::Sent));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            WorkflowStatus::Draft,
            WorkflowStatus::Sent,
            WorkflowStatus::Approved,
            WorkflowStatus::LeaserReview,
            WorkflowStatus::Financed,
            WorkflowStatus::Rejected,
        ] {
            assert_eq!(WorkflowStatus::from_string(status.as_str()), status);
        }
    }
}
