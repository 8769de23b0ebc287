//! API key gate for the public catalog.
//!
//! Every catalog route carries the company id in its path; the presented
//! `x-api-key` must digest to a key issued for that same company. Keys are
//! compared by SHA-256 digest, the plaintext is never stored anywhere.

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use service_core::error::AppError;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::services::metrics::{record_auth_failure, record_catalog_request};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct CompanyScope {
    company_id: String,
}

/// Hash a presented key for lookup.
pub fn digest_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

pub async fn require_api_key(
    State(state): State<AppState>,
    Path(scope): Path<CompanyScope>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let company_id = Uuid::parse_str(&scope.company_id).map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid company id in path: {}",
            scope.company_id
        ))
    })?;

    let api_key = req
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    let api_key = match api_key {
        Some(key) => key,
        None => {
            record_auth_failure("missing_key");
            return Err(AppError::AuthError(anyhow::anyhow!(
                "Missing x-api-key header"
            )));
        }
    };

    let record = state.db.find_api_key(&digest_key(api_key)).await?;

    let record = match record {
        Some(record) => record,
        None => {
            record_auth_failure("unknown_key");
            return Err(AppError::AuthError(anyhow::anyhow!("Invalid API key")));
        }
    };

    if record.company_id != company_id {
        record_auth_failure("company_mismatch");
        return Err(AppError::AuthError(anyhow::anyhow!(
            "API key does not match this catalog"
        )));
    }

    // Update last_used_utc (async, don't block)
    let db = state.db.clone();
    let key_id = record.key_id;
    tokio::spawn(async move {
        let _ = db.touch_api_key(key_id).await;
    });

    record_catalog_request(&company_id.to_string());

    Ok(next.run(req).await)
}
