//! Pack endpoints. The detail view resolves items to product names.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Pack, PackDetail};
use crate::startup::AppState;

pub async fn list_packs(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<Pack>>, AppError> {
    let packs = state.db.list_packs(company_id).await?;

    Ok(Json(packs))
}

pub async fn get_pack(
    State(state): State<AppState>,
    Path((company_id, pack_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PackDetail>, AppError> {
    let pack = state
        .db
        .get_pack(company_id, pack_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Pack not found")))?;

    let items = state.db.list_pack_items(pack.pack_id).await?;

    Ok(Json(PackDetail { pack, items }))
}
