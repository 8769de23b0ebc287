//! Contract handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CompanyContext;
use crate::models::{Contract, ContractStatus, CreateContract, ListContractsFilter};
use crate::services::metrics::record_contract_operation;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateContractStatusRequest {
    pub status: ContractStatus,
}

/// Creates a contract from an accepted offer, copying its equipment lines.
pub async fn create_contract(
    State(state): State<AppState>,
    company: CompanyContext,
    Json(payload): Json<CreateContract>,
) -> Result<(StatusCode, Json<Contract>), AppError> {
    payload.validate()?;

    let contract = state
        .db
        .create_contract(company.company_id, &payload)
        .await?;
    record_contract_operation(&company.company_id.to_string(), "create");

    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn get_contract(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Contract>, AppError> {
    let contract = state
        .db
        .get_contract(company.company_id, contract_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contract not found")))?;

    Ok(Json(contract))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    company: CompanyContext,
    Query(filter): Query<ListContractsFilter>,
) -> Result<Json<Vec<Contract>>, AppError> {
    let contracts = state.db.list_contracts(company.company_id, &filter).await?;

    Ok(Json(contracts))
}

/// Steps the contract one stage forward in its pipeline.
pub async fn update_contract_status(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(contract_id): Path<Uuid>,
    Json(payload): Json<UpdateContractStatusRequest>,
) -> Result<Json<Contract>, AppError> {
    let contract = state
        .db
        .update_contract_status(company.company_id, contract_id, payload.status)
        .await?;
    record_contract_operation(&company.company_id.to_string(), "status");

    Ok(Json(contract))
}
