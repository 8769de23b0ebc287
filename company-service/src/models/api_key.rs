//! Catalog API key model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Stored API key row. Holds the digest and a display prefix, never the
/// plaintext key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKey {
    pub key_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_digest: String,
    pub key_prefix: String,
    pub created_utc: DateTime<Utc>,
    pub last_used_utc: Option<DateTime<Utc>>,
}

/// Input for issuing a key.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApiKey {
    #[validate(length(min = 1, message = "Key name is required"))]
    pub name: String,
}

/// Issue response. The only place the plaintext key ever appears.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedApiKey {
    pub key_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub api_key: String,
    pub key_prefix: String,
    pub created_utc: DateTime<Utc>,
}
