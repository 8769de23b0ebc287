//! Company registry handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    is_valid_slug, Company, CreateCompany, UpdateCompany, UpdateModules, UpdateSubscriptionPeriod,
};
use crate::services::metrics::{record_company_operation, record_subscription_read};
use crate::startup::AppState;
use crate::subscription::SubscriptionView;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListCompaniesQuery {
    pub slug: Option<String>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

impl Default for ListCompaniesQuery {
    fn default() -> Self {
        Self {
            slug: None,
            page_size: 50,
            page_token: None,
        }
    }
}

pub async fn create_company(
    State(state): State<AppState>,
    Json(payload): Json<CreateCompany>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    payload.validate()?;
    if !is_valid_slug(&payload.slug) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Slug must be lowercase letters, digits and inner hyphens: {}",
            payload.slug
        )));
    }

    let company = state.db.create_company(&payload).await?;
    record_company_operation("create");

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = state
        .db
        .get_company(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    Ok(Json(company))
}

pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<ListCompaniesQuery>,
) -> Result<Json<Vec<Company>>, AppError> {
    let companies = state
        .db
        .list_companies(query.slug.as_deref(), query.page_size, query.page_token)
        .await?;

    Ok(Json(companies))
}

pub async fn update_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpdateCompany>,
) -> Result<Json<Company>, AppError> {
    payload.validate()?;
    if let Some(ref slug) = payload.slug {
        if !is_valid_slug(slug) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Slug must be lowercase letters, digits and inner hyphens: {}",
                slug
            )));
        }
    }

    let company = state
        .db
        .update_company(company_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;
    record_company_operation("update");

    Ok(Json(company))
}

pub async fn delete_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_company(company_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Company not found")));
    }
    record_company_operation("delete");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = state
        .db
        .set_company_active(company_id, true)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;
    record_company_operation("activate");

    Ok(Json(company))
}

pub async fn deactivate_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = state
        .db
        .set_company_active(company_id, false)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;
    record_company_operation("deactivate");

    Ok(Json(company))
}

/// Derived subscription view. Nothing here is stored; the status is computed
/// against the clock on every call.
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<SubscriptionView>, AppError> {
    let company = state
        .db
        .get_company(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    let view = SubscriptionView::derive(&company, Utc::now());
    record_subscription_read(view.status.as_str());

    Ok(Json(view))
}

pub async fn update_subscription_period(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpdateSubscriptionPeriod>,
) -> Result<Json<SubscriptionView>, AppError> {
    let company = state
        .db
        .update_subscription_period(company_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;
    record_company_operation("period_update");

    Ok(Json(SubscriptionView::derive(&company, Utc::now())))
}

pub async fn update_modules(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpdateModules>,
) -> Result<Json<Company>, AppError> {
    let company = state
        .db
        .update_modules(company_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;
    record_company_operation("modules_update");

    Ok(Json(company))
}
