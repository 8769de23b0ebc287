//! Equipment line handlers, nested under offers and contracts.
//!
//! Offer equipment is editable until the offer is signed. Contract equipment
//! is created by the contract copy and only its assignment changes afterwards.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

use crate::finance;
use crate::middleware::CompanyContext;
use crate::models::{CreateEquipmentLine, EquipmentLine, Offer, ParentType, UpdateEquipmentLine};
use crate::startup::AppState;

/// Fail-fast checks on a new equipment line: financial fields through the
/// calculator, then the conditionally-required delivery fields.
pub(crate) fn validate_line(line: &CreateEquipmentLine) -> Result<(), AppError> {
    if line.title.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Equipment title is required"
        )));
    }
    finance::margin_amount(line.purchase_price, line.quantity, line.margin_percent)?;
    if line.monthly_payment_total < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "monthly payment must not be negative, got {}",
            line.monthly_payment_total
        )));
    }
    if let Some(field) = line.missing_delivery_field() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Missing delivery field: {}",
            field
        )));
    }
    Ok(())
}

/// Resolves the offer within the tenant and rejects signed offers, which can
/// no longer have their equipment edited.
async fn ensure_editable_offer(
    state: &AppState,
    company_id: Uuid,
    offer_id: Uuid,
) -> Result<Offer, AppError> {
    let offer = state
        .db
        .get_offer(company_id, offer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;
    if offer.is_signed() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Offer {} is signed and its equipment can no longer be modified",
            offer_id
        )));
    }
    Ok(offer)
}

pub async fn add_offer_equipment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
    Json(payload): Json<CreateEquipmentLine>,
) -> Result<(StatusCode, Json<EquipmentLine>), AppError> {
    validate_line(&payload)?;
    ensure_editable_offer(&state, company.company_id, offer_id).await?;

    let line = state
        .db
        .add_equipment(ParentType::Offer, offer_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn list_offer_equipment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<Vec<EquipmentLine>>, AppError> {
    state
        .db
        .get_offer(company.company_id, offer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;

    let lines = state.db.list_equipment(ParentType::Offer, offer_id).await?;

    Ok(Json(lines))
}

pub async fn update_offer_equipment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path((offer_id, equipment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateEquipmentLine>,
) -> Result<Json<EquipmentLine>, AppError> {
    if let Some(price) = payload.purchase_price {
        if price < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "purchase price must not be negative, got {}",
                price
            )));
        }
    }
    if let Some(quantity) = payload.quantity {
        if quantity < 1 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "quantity must be at least 1, got {}",
                quantity
            )));
        }
    }
    if let Some(margin) = payload.margin_percent {
        if margin < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "margin must not be negative, got {}",
                margin
            )));
        }
    }
    if let Some(monthly) = payload.monthly_payment_total {
        if monthly < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "monthly payment must not be negative, got {}",
                monthly
            )));
        }
    }

    ensure_editable_offer(&state, company.company_id, offer_id).await?;

    state
        .db
        .get_equipment(ParentType::Offer, equipment_id)
        .await?
        .filter(|line| line.parent_id == offer_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Equipment line not found")))?;

    let line = state
        .db
        .update_equipment(ParentType::Offer, equipment_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Equipment line not found")))?;

    Ok(Json(line))
}

pub async fn delete_offer_equipment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path((offer_id, equipment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    ensure_editable_offer(&state, company.company_id, offer_id).await?;

    state
        .db
        .get_equipment(ParentType::Offer, equipment_id)
        .await?
        .filter(|line| line.parent_id == offer_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Equipment line not found")))?;

    state
        .db
        .delete_equipment(ParentType::Offer, equipment_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_contract_equipment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Vec<EquipmentLine>>, AppError> {
    state
        .db
        .get_contract(company.company_id, contract_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contract not found")))?;

    let lines = state
        .db
        .list_equipment(ParentType::Contract, contract_id)
        .await?;

    Ok(Json(lines))
}
