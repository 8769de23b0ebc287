//! Offer wizard submission handler.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

use crate::middleware::CompanyContext;
use crate::models::{OfferType, OfferWithEquipment};
use crate::services::metrics::record_wizard_submission;
use crate::startup::AppState;
use crate::wizard::{OfferWizard, WizardData, WizardError, WizardStep, WizardSubmission};

#[derive(Debug, Deserialize)]
pub struct WizardSubmitRequest {
    #[serde(flatten)]
    pub data: WizardData,
    pub offer_type: Option<OfferType>,
}

/// Walks the wizard through every step server-side, so a client cannot
/// bypass a validation by posting a hand-built payload.
fn run_wizard(data: WizardData, offer_type: OfferType) -> Result<WizardSubmission, WizardError> {
    let mut wizard = OfferWizard::with_data(data);
    while wizard.current_step() != WizardStep::Preview {
        wizard.advance()?;
    }
    wizard.build(offer_type)
}

/// Accepts the accumulated wizard payload and persists one offer with its
/// equipment lines, creating the client first when the wizard introduced one.
pub async fn submit_wizard(
    State(state): State<AppState>,
    company: CompanyContext,
    Json(payload): Json<WizardSubmitRequest>,
) -> Result<(StatusCode, Json<OfferWithEquipment>), AppError> {
    let offer_type = payload.offer_type.unwrap_or(OfferType::AdminOffer);

    let submission = match run_wizard(payload.data, offer_type) {
        Ok(submission) => submission,
        Err(err) => {
            record_wizard_submission(&company.company_id.to_string(), "rejected");
            return Err(err.into());
        }
    };

    let mut offer_input = submission.offer;
    if let Some(new_client) = &submission.new_client {
        new_client.validate()?;
        let client = state.db.create_client(company.company_id, new_client).await?;
        offer_input.client_id = Some(client.client_id);
    }

    let (offer, equipment) = state
        .db
        .create_offer(company.company_id, &offer_input)
        .await?;
    record_wizard_submission(&company.company_id.to_string(), "created");

    Ok((
        StatusCode::CREATED,
        Json(OfferWithEquipment { offer, equipment }),
    ))
}
