//! Client handlers.

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
use crate::models::{Client, CreateClient, UpdateClient};
use crate::startup::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListClientsQuery {
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

impl Default for ListClientsQuery {
    fn default() -> Self {
        Self {
            page_size: 50,
            page_token: None,
        }
    }
}

pub async fn create_client(
    State(state): State<AppState>,
    company: CompanyContext,
    Json(payload): Json<CreateClient>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    payload.validate()?;

    let client = state.db.create_client(company.company_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    let client = state
        .db
        .get_client(company.company_id, client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    Ok(Json(client))
}

pub async fn list_clients(
    State(state): State<AppState>,
    company: CompanyContext,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    let clients = state
        .db
        .list_clients(company.company_id, query.page_size, query.page_token)
        .await?;

    Ok(Json(clients))
}

pub async fn update_client(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<UpdateClient>,
) -> Result<Json<Client>, AppError> {
    payload.validate()?;

    let client = state
        .db
        .update_client(company.company_id, client_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    Ok(Json(client))
}

pub async fn delete_client(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(client_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_client(company.company_id, client_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Client not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}
