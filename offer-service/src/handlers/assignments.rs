//! Equipment assignment registry handlers.
//!
//! The API boundary is where the UI's sentinel strings ("unassigned",
//! "virtual-primary") die: `CollaboratorRef` deserializes them to `None`, so
//! the store only ever sees real collaborator ids or NULL.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::middleware::CompanyContext;
use crate::models::{CollaboratorGroup, CollaboratorRef, EquipmentLine, ParentType};
use crate::services::metrics::record_assignment_operation;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignEquipmentRequest {
    pub collaborator_id: CollaboratorRef,
}

/// One audit entry, with the collaborator name resolved at read time. A
/// deleted collaborator keeps its id but gets a placeholder name.
#[derive(Debug, Serialize)]
pub struct AssignmentHistoryEntry {
    pub history_id: Uuid,
    pub collaborator_id: Option<Uuid>,
    pub collaborator_name: String,
    pub assigned_by: Option<String>,
    pub created_utc: DateTime<Utc>,
}

fn parse_parent_type(raw: &str) -> Result<ParentType, AppError> {
    match raw {
        "offer" => Ok(ParentType::Offer),
        "contract" => Ok(ParentType::Contract),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "Unknown parent type: {}",
            raw
        ))),
    }
}

/// Resolves an equipment line and checks its parent belongs to the tenant.
async fn ensure_equipment_in_tenant(
    state: &AppState,
    company_id: Uuid,
    parent_type: ParentType,
    equipment_id: Uuid,
) -> Result<EquipmentLine, AppError> {
    let line = state
        .db
        .get_equipment(parent_type, equipment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Equipment line not found")))?;

    let in_tenant = match parent_type {
        ParentType::Offer => state.db.get_offer(company_id, line.parent_id).await?.is_some(),
        ParentType::Contract => state
            .db
            .get_contract(company_id, line.parent_id)
            .await?
            .is_some(),
    };
    if !in_tenant {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Equipment line not found"
        )));
    }

    Ok(line)
}

/// Equipment a client can assign: contract lines only.
pub async fn client_equipment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<EquipmentLine>>, AppError> {
    state
        .db
        .get_client(company.company_id, client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    let lines = state.db.client_equipment(client_id).await?;

    Ok(Json(lines))
}

/// Client equipment grouped per collaborator, primary first, with the
/// unassigned group always present.
pub async fn equipment_by_collaborator(
    State(state): State<AppState>,
    company: CompanyContext,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<CollaboratorGroup>>, AppError> {
    state
        .db
        .get_client(company.company_id, client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    let groups = state.db.equipment_by_collaborator(client_id).await?;

    Ok(Json(groups))
}

/// Points an equipment line at a collaborator, or unassigns it.
pub async fn assign_equipment(
    State(state): State<AppState>,
    company: CompanyContext,
    Path((parent_type, equipment_id)): Path<(String, Uuid)>,
    Json(payload): Json<AssignEquipmentRequest>,
) -> Result<Json<EquipmentLine>, AppError> {
    let parent_type = parse_parent_type(&parent_type)?;
    ensure_equipment_in_tenant(&state, company.company_id, parent_type, equipment_id).await?;

    if let Some(collaborator_id) = payload.collaborator_id.0 {
        let collaborator = state
            .db
            .get_collaborator(collaborator_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Collaborator not found")))?;
        state
            .db
            .get_client(company.company_id, collaborator.client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Collaborator not found")))?;
    }

    let line = state
        .db
        .assign_equipment(
            parent_type,
            equipment_id,
            payload.collaborator_id.0,
            company.user_email.as_deref(),
        )
        .await?;

    let operation = if payload.collaborator_id.0.is_some() {
        "assign"
    } else {
        "unassign"
    };
    record_assignment_operation(parent_type.as_str(), operation);

    Ok(Json(line))
}

/// Newest-first audit trail for one equipment line.
pub async fn assignment_history(
    State(state): State<AppState>,
    company: CompanyContext,
    Path((parent_type, equipment_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<AssignmentHistoryEntry>>, AppError> {
    let parent_type = parse_parent_type(&parent_type)?;
    ensure_equipment_in_tenant(&state, company.company_id, parent_type, equipment_id).await?;

    let records = state.db.assignment_history(parent_type, equipment_id).await?;
    let entries = records
        .into_iter()
        .map(|record| AssignmentHistoryEntry {
            history_id: record.history_id,
            collaborator_id: record.collaborator_id,
            collaborator_name: record.display_name().to_string(),
            assigned_by: record.assigned_by.clone(),
            created_utc: record.created_utc,
        })
        .collect();

    Ok(Json(entries))
}
