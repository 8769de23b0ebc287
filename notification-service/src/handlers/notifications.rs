//! Notification row lookup.

use axum::extract::{Path, State};
use axum::Json;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::NotificationRecord;
use crate::startup::AppState;

/// Dispatch state and metadata of a previously accepted email.
#[tracing::instrument(skip(state), fields(notification_id = %notification_id))]
pub async fn get_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<NotificationRecord>, AppError> {
    let record = state
        .db
        .get_notification(notification_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Notification not found")))?;

    Ok(Json(record))
}
