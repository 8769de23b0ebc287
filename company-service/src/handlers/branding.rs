//! Branding theme handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{is_valid_color, CompanyBranding, UpdateBranding};
use crate::services::metrics::record_company_operation;
use crate::startup::AppState;

pub async fn get_branding(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyBranding>, AppError> {
    let company = state
        .db
        .get_company(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    Ok(Json(company.branding()))
}

pub async fn update_branding(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpdateBranding>,
) -> Result<Json<CompanyBranding>, AppError> {
    payload.validate()?;
    for color in [
        payload.primary_color.as_deref(),
        payload.secondary_color.as_deref(),
        payload.accent_color.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if !is_valid_color(color) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Colors must be #RRGGBB hex values: {}",
                color
            )));
        }
    }

    let company = state
        .db
        .update_branding(company_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;
    record_company_operation("branding_update");

    Ok(Json(company.branding()))
}
