//! Company-facing catalog endpoints: profile, presentation settings,
//! customizations and the environmental report.
//!
//! Settings and customizations are optional rows; readers always get an
//! answer, falling back to defaults or the company profile.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    CatalogSettings, CompanyCustomizations, CompanyProfile, EnvironmentalReport,
};
use crate::startup::AppState;

pub async fn get_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyProfile>, AppError> {
    let profile = state
        .db
        .get_company_profile(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    Ok(Json(profile))
}

pub async fn get_settings(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CatalogSettings>, AppError> {
    let settings = state
        .db
        .get_catalog_settings(company_id)
        .await?
        .unwrap_or_else(|| CatalogSettings::default_for(company_id));

    Ok(Json(settings))
}

pub async fn get_customizations(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyCustomizations>, AppError> {
    if let Some(customizations) = state.db.get_customizations(company_id).await? {
        return Ok(Json(customizations));
    }

    let profile = state
        .db
        .get_company_profile(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    Ok(Json(CompanyCustomizations::from_profile(&profile)))
}

pub async fn environmental_report(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<EnvironmentalReport>, AppError> {
    let report = state.db.environmental_report(company_id).await?;

    Ok(Json(report))
}
