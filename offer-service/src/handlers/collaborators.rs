//! Collaborator handlers, nested under clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::CompanyContext;
use crate::models::{Collaborator, CreateCollaborator, UpdateCollaborator};
use crate::startup::AppState;

/// Resolves the client within the tenant, or 404.
async fn ensure_client(
    state: &AppState,
    company_id: Uuid,
    client_id: Uuid,
) -> Result<(), AppError> {
    state
        .db
        .get_client(company_id, client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;
    Ok(())
}

pub async fn create_collaborator(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<CreateCollaborator>,
) -> Result<(StatusCode, Json<Collaborator>), AppError> {
    payload.validate()?;
    ensure_client(&state, company.company_id, client_id).await?;

    let collaborator = state.db.create_collaborator(client_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(collaborator)))
}

/// Lists a client's collaborators, primary first.
pub async fn list_collaborators(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<Collaborator>>, AppError> {
    ensure_client(&state, company.company_id, client_id).await?;

    let collaborators = state.db.list_collaborators(client_id).await?;

    Ok(Json(collaborators))
}

pub async fn update_collaborator(
    State(state): State<AppState>,
    company: CompanyContext,
    Path((client_id, collaborator_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCollaborator>,
) -> Result<Json<Collaborator>, AppError> {
    payload.validate()?;
    ensure_client(&state, company.company_id, client_id).await?;

    let existing = state
        .db
        .get_collaborator(collaborator_id)
        .await?
        .filter(|c| c.client_id == client_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Collaborator not found")))?;

    let collaborator = state
        .db
        .update_collaborator(existing.collaborator_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Collaborator not found")))?;

    Ok(Json(collaborator))
}

pub async fn delete_collaborator(
    State(state): State<AppState>,
    company: CompanyContext,
    Path((client_id, collaborator_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    ensure_client(&state, company.company_id, client_id).await?;

    state
        .db
        .get_collaborator(collaborator_id)
        .await?
        .filter(|c| c.client_id == client_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Collaborator not found")))?;

    state.db.delete_collaborator(collaborator_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
