//! Mandate setup handler.

use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

use crate::models::{split_name, CreateMandate, MandateResult};
use crate::services::direct_debit::MandateDetails;
use crate::services::metrics::record_mandate_operation;
use crate::startup::AppState;

/// Runs the three-call provider sequence for a contract and persists the
/// resulting identifiers onto its row.
pub async fn create_mandate(
    State(state): State<AppState>,
    Json(payload): Json<CreateMandate>,
) -> Result<(StatusCode, Json<MandateResult>), AppError> {
    let billing = state
        .db
        .get_contract_billing(payload.contract_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contract not found")))?;

    let email = billing
        .client_email
        .clone()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Contract has no linked client to bill")))?;

    let (given_name, family_name) = split_name(&billing.client_name);
    let details = MandateDetails {
        contract_id: billing.contract_id,
        email,
        given_name,
        family_name,
        company_name: billing.client_company.clone(),
    };

    let setup = match state.provider.setup_mandate(&details).await {
        Ok(setup) => setup,
        Err(e) => {
            record_mandate_operation("failed");
            return Err(e);
        }
    };

    state
        .db
        .update_mandate_ids(billing.contract_id, &setup)
        .await?;
    record_mandate_operation("created");

    tracing::info!(
        contract_id = %billing.contract_id,
        customer_id = %setup.customer_id,
        environment = %setup.environment,
        "Mandate setup completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(MandateResult {
            contract_id: billing.contract_id,
            customer_id: setup.customer_id,
            billing_request_id: setup.billing_request_id,
            flow_id: setup.flow_id,
            authorisation_url: setup.authorisation_url,
            environment: setup.environment,
        }),
    ))
}
