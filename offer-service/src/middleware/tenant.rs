//! Company context middleware for multi-tenancy support.
//!
//! Extracts the tenant company from request headers. The gateway sets these
//! after authenticating the caller and resolving their company membership,
//! so every query in a request is scoped to exactly one company.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

/// Tenant scope extracted from request headers.
#[derive(Debug, Clone)]
pub struct CompanyContext {
    /// Company the request operates on.
    pub company_id: Uuid,
    /// Email of the acting user, when the gateway forwards it. Used for
    /// audit fields such as assignment history.
    pub user_email: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-Company-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing X-Company-ID header (required from gateway)"
                ))
            })?;

        let company_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!("Invalid X-Company-ID header: {}", raw))
        })?;

        let user_email = parts
            .headers
            .get("X-User-Email")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Add to tracing span for observability
        let span = tracing::Span::current();
        span.record("company_id", raw);

        Ok(CompanyContext {
            company_id,
            user_email,
        })
    }
}
