//! Offer handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::finance::EquipmentTotals;
use crate::handlers::equipment::validate_line;
use crate::middleware::CompanyContext;
use crate::models::{
    CreateOffer, ListOffersFilter, Offer, OfferStatus, OfferWithEquipment, ParentType,
    UpdateOffer, WorkflowStatus,
};
use crate::services::metrics::record_offer_operation;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateOfferStatusRequest {
    pub status: Option<OfferStatus>,
    pub workflow_status: Option<WorkflowStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignOfferRequest {
    #[validate(length(min = 1, message = "Signer name is required"))]
    pub signer_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TotalsQuery {
    pub margin_with_difference: Option<Decimal>,
}

/// Aggregate totals plus the margin figure to display, which an explicit
/// override takes precedence over.
#[derive(Debug, Serialize)]
pub struct OfferTotalsResponse {
    #[serde(flatten)]
    pub totals: EquipmentTotals,
    pub display_margin: Decimal,
}

fn check_financials(
    amount: Option<Decimal>,
    coefficient: Option<Decimal>,
    monthly_payment: Option<Decimal>,
    commission: Option<Decimal>,
) -> Result<(), AppError> {
    if let Some(amount) = amount {
        if amount < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "amount must not be negative, got {}",
                amount
            )));
        }
    }
    if let Some(coefficient) = coefficient {
        if coefficient <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "coefficient must be positive, got {}",
                coefficient
            )));
        }
    }
    if let Some(monthly_payment) = monthly_payment {
        if monthly_payment < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "monthly payment must not be negative, got {}",
                monthly_payment
            )));
        }
    }
    if let Some(commission) = commission {
        if commission < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "commission must not be negative, got {}",
                commission
            )));
        }
    }
    Ok(())
}

pub async fn create_offer(
    State(state): State<AppState>,
    company: CompanyContext,
    Json(payload): Json<CreateOffer>,
) -> Result<(StatusCode, Json<OfferWithEquipment>), AppError> {
    payload.validate()?;
    check_financials(
        Some(payload.amount),
        Some(payload.coefficient),
        Some(payload.monthly_payment),
        payload.commission,
    )?;
    for line in &payload.equipment {
        validate_line(line)?;
    }

    let (offer, equipment) = state.db.create_offer(company.company_id, &payload).await?;
    record_offer_operation(&company.company_id.to_string(), "create");

    Ok((
        StatusCode::CREATED,
        Json(OfferWithEquipment { offer, equipment }),
    ))
}

pub async fn get_offer(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<OfferWithEquipment>, AppError> {
    let offer = state
        .db
        .get_offer(company.company_id, offer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;
    let equipment = state.db.list_equipment(ParentType::Offer, offer_id).await?;

    Ok(Json(OfferWithEquipment { offer, equipment }))
}

pub async fn list_offers(
    State(state): State<AppState>,
    company: CompanyContext,
    Query(filter): Query<ListOffersFilter>,
) -> Result<Json<Vec<Offer>>, AppError> {
    let offers = state.db.list_offers(company.company_id, &filter).await?;

    Ok(Json(offers))
}

pub async fn update_offer(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
    Json(payload): Json<UpdateOffer>,
) -> Result<Json<Offer>, AppError> {
    payload.validate()?;
    check_financials(
        payload.amount,
        payload.coefficient,
        payload.monthly_payment,
        payload.commission,
    )?;

    let offer = state
        .db
        .update_offer(company.company_id, offer_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;
    record_offer_operation(&company.company_id.to_string(), "update");

    Ok(Json(offer))
}

pub async fn delete_offer(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_offer(company.company_id, offer_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Offer not found")));
    }
    record_offer_operation(&company.company_id.to_string(), "delete");

    Ok(StatusCode::NO_CONTENT)
}

/// Applies accept/reject and workflow transitions, each checked against the
/// legal transition table.
pub async fn update_offer_status(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
    Json(payload): Json<UpdateOfferStatusRequest>,
) -> Result<Json<Offer>, AppError> {
    if payload.status.is_none() && payload.workflow_status.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "No transition requested"
        )));
    }

    let offer = state
        .db
        .update_offer_status(
            company.company_id,
            offer_id,
            payload.status,
            payload.workflow_status,
        )
        .await?;
    record_offer_operation(&company.company_id.to_string(), "status");

    Ok(Json(offer))
}

/// Records the signature and freezes the offer.
pub async fn sign_offer(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
    Json(payload): Json<SignOfferRequest>,
) -> Result<Json<Offer>, AppError> {
    payload.validate()?;

    let offer = state
        .db
        .sign_offer(company.company_id, offer_id, &payload.signer_name)
        .await?;
    record_offer_operation(&company.company_id.to_string(), "sign");

    Ok(Json(offer))
}

pub async fn offer_totals(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(offer_id): Path<Uuid>,
    Query(query): Query<TotalsQuery>,
) -> Result<Json<OfferTotalsResponse>, AppError> {
    let totals = state.db.offer_totals(company.company_id, offer_id).await?;
    let display_margin = totals.display_margin(query.margin_with_difference);

    Ok(Json(OfferTotalsResponse {
        totals,
        display_margin,
    }))
}
