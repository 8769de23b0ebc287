//! Document rendering handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::OfferPdfData;
use crate::pdf;
use crate::services::metrics::{record_pdf, RENDER_DURATION};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct OfferPdfRequest {
    pub offer_id: Uuid,
}

/// Render an offer as a PDF and return the bytes with a download filename.
#[tracing::instrument(skip(state, request), fields(offer_id = %request.offer_id))]
pub async fn render_offer_pdf(
    State(state): State<AppState>,
    Json(request): Json<OfferPdfRequest>,
) -> Result<impl IntoResponse, AppError> {
    let offer = state
        .db
        .get_offer_document(request.offer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;

    let client = match offer.client_id {
        Some(client_id) => state.db.get_client_details(client_id).await?,
        None => None,
    };
    let company = state.db.get_company_branding(offer.company_id).await?;
    let lines = state.db.list_equipment(offer.offer_id).await?;

    let data = OfferPdfData {
        offer,
        client,
        company,
        lines,
    };

    let timer = RENDER_DURATION.start_timer();
    let rendered = match pdf::render_offer(&data) {
        Ok(rendered) => rendered,
        Err(e) => {
            timer.observe_duration();
            record_pdf("failed");
            tracing::error!(error = %e, "Offer PDF rendering failed");
            return Err(e);
        }
    };
    timer.observe_duration();
    record_pdf("rendered");

    tracing::info!(
        offer_id = %request.offer_id,
        pages = rendered.pages,
        bytes = rendered.bytes.len(),
        "Offer PDF rendered"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", rendered.filename),
            ),
        ],
        rendered.bytes,
    ))
}
