//! Contract model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Delivery/activation pipeline of a signed agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    ContractSent,
    EquipmentOrdered,
    Delivered,
    Active,
    Completed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::ContractSent => "contract_sent",
            ContractStatus::EquipmentOrdered => "equipment_ordered",
            ContractStatus::Delivered => "delivered",
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "equipment_ordered" => ContractStatus::EquipmentOrdered,
            "delivered" => ContractStatus::Delivered,
            "active" => ContractStatus::Active,
            "completed" => ContractStatus::Completed,
            _ => ContractStatus::ContractSent,
        }
    }

    /// Contracts only step forward, one stage at a time.
    pub fn can_transition_to(&self, next: ContractStatus) -> bool {
        matches!(
            (self, next),
            (ContractStatus::ContractSent, ContractStatus::EquipmentOrdered)
                | (ContractStatus::EquipmentOrdered, ContractStatus::Delivered)
                | (ContractStatus::Delivered, ContractStatus::Active)
                | (ContractStatus::Active, ContractStatus::Completed)
        )
    }
}

/// Signed, billable agreement derived from an accepted offer.
///
/// The `dd_*` columns are filled by the payment service once a direct-debit
/// mandate has been set up for the contract.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub contract_id: Uuid,
    pub company_id: Uuid,
    pub offer_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub monthly_payment: Decimal,
    pub leaser_name: String,
    pub status: String,
    pub dd_customer_id: Option<String>,
    pub dd_billing_request_id: Option<String>,
    pub dd_flow_id: Option<String>,
    pub dd_authorisation_url: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a contract from an accepted offer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateContract {
    pub offer_id: Uuid,
    #[validate(length(min = 1, message = "Leaser name is required"))]
    pub leaser_name: String,
}

/// Filter parameters for listing contracts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListContractsFilter {
    pub client_id: Option<Uuid>,
    pub status: Option<ContractStatus>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

impl Default for ListContractsFilter {
    fn default() -> Self {
        Self {
            client_id: None,
            status: None,
            page_size: 50,
            page_token: None,
        }
    }
}
