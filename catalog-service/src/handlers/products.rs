//! Product read endpoints of the public catalog.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Product, ProductCo2, VariantPrice};
use crate::startup::AppState;

const RELATED_LIMIT: i64 = 8;

fn default_page_size() -> i32 {
    24
}

fn default_search_limit() -> i64 {
    24
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

/// Resolves the product within the catalog, or 404.
async fn ensure_product(
    state: &AppState,
    company_id: Uuid,
    product_id: Uuid,
) -> Result<(), AppError> {
    state
        .db
        .get_product(company_id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;
    Ok(())
}

/// Lists active products, brand and category labels resolved.
pub async fn list_products(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .db
        .list_products(company_id, query.page_size, query.page_token)
        .await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path((company_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .db
        .get_product(company_id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(product))
}

pub async fn list_variant_prices(
    State(state): State<AppState>,
    Path((company_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<VariantPrice>>, AppError> {
    ensure_product(&state, company_id, product_id).await?;

    let variants = state.db.list_variant_prices(company_id, product_id).await?;

    Ok(Json(variants))
}

/// Active products sharing the category, newest first.
pub async fn related_products(
    State(state): State<AppState>,
    Path((company_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<Product>>, AppError> {
    ensure_product(&state, company_id, product_id).await?;

    let products = state
        .db
        .related_products(company_id, product_id, RELATED_LIMIT)
        .await?;

    Ok(Json(products))
}

pub async fn product_co2(
    State(state): State<AppState>,
    Path((company_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProductCo2>, AppError> {
    let co2 = state
        .db
        .product_co2(company_id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(co2))
}

pub async fn search_products(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Search query must not be empty"
        )));
    }

    let limit = query.limit.clamp(1, 100);
    let products = state.db.search_products(company_id, q, limit).await?;

    Ok(Json(products))
}
