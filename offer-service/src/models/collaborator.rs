//! Collaborator model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Named contact within a client organization. At most one collaborator per
/// client carries `is_primary = true` (enforced by a partial unique index).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collaborator {
    pub collaborator_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub is_primary: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a collaborator under a client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCollaborator {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Input for updating a collaborator.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCollaborator {
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_primary: Option<bool>,
}
