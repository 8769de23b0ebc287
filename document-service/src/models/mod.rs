//! Read models for document rendering.
//!
//! All rows here are owned by other services; this service only reads them
//! to lay out a document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Offer row as needed for the document header and totals.
#[derive(Debug, Clone, FromRow)]
pub struct OfferDocument {
    pub offer_id: Uuid,
    pub company_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub amount: Decimal,
    pub coefficient: Decimal,
    pub monthly_payment: Decimal,
    pub status: String,
    pub workflow_status: String,
    pub remarks: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub signer_name: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Client address block. Every field except the name may be missing.
#[derive(Debug, Clone, FromRow)]
pub struct ClientDetails {
    pub name: String,
    pub email: String,
    pub company_name: String,
    pub vat_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Issuing company with its branding colors.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyBranding {
    pub name: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
}

/// One equipment table row.
#[derive(Debug, Clone, FromRow)]
pub struct EquipmentLine {
    pub title: String,
    pub purchase_price: Decimal,
    pub quantity: i32,
    pub margin_percent: Decimal,
    pub monthly_payment_total: Decimal,
}

/// Everything the renderer needs for one offer document.
///
/// `client` is `None` when the offer's client row was deleted; the document
/// then falls back to the name and email snapshotted on the offer itself.
#[derive(Debug, Clone)]
pub struct OfferPdfData {
    pub offer: OfferDocument,
    pub client: Option<ClientDetails>,
    pub company: Option<CompanyBranding>,
    pub lines: Vec<EquipmentLine>,
}
