//! Category and brand listings.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Brand, Category};
use crate::startup::AppState;

pub async fn list_categories(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.db.list_categories(company_id).await?;

    Ok(Json(categories))
}

pub async fn list_brands(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<Brand>>, AppError> {
    let brands = state.db.list_brands(company_id).await?;

    Ok(Json(brands))
}
