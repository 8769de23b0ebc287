//! Catalog API key handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{ApiKey, CreateApiKey, IssuedApiKey};
use crate::services::keys;
use crate::services::metrics::record_api_key_operation;
use crate::startup::AppState;

/// Issue a key for a company. The plaintext is in this response and nowhere
/// else; only the digest is stored.
pub async fn issue_api_key(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreateApiKey>,
) -> Result<(StatusCode, Json<IssuedApiKey>), AppError> {
    payload.validate()?;

    state
        .db
        .get_company(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    let api_key = keys::generate_key();
    let stored = state
        .db
        .create_api_key(
            company_id,
            &payload.name,
            &keys::digest_key(&api_key),
            &keys::key_prefix(&api_key),
        )
        .await?;
    record_api_key_operation("issue");

    Ok((
        StatusCode::CREATED,
        Json(IssuedApiKey {
            key_id: stored.key_id,
            company_id: stored.company_id,
            name: stored.name,
            api_key,
            key_prefix: stored.key_prefix,
            created_utc: stored.created_utc,
        }),
    ))
}

pub async fn list_api_keys(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<ApiKey>>, AppError> {
    state
        .db
        .get_company(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    let keys = state.db.list_api_keys(company_id).await?;

    Ok(Json(keys))
}

pub async fn revoke_api_key(
    State(state): State<AppState>,
    Path((company_id, key_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let revoked = state.db.delete_api_key(company_id, key_id).await?;
    if !revoked {
        return Err(AppError::NotFound(anyhow::anyhow!("API key not found")));
    }
    record_api_key_operation("revoke");

    Ok(StatusCode::NO_CONTENT)
}
