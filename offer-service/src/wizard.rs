//! Offer generation wizard.
//!
//! Linear five-step flow (client → profile → equipment → financing →
//! preview) accumulating input in memory. Advancing requires the current
//! step to validate; earlier steps may be revisited freely and later steps
//! are not re-checked afterwards. Nothing is persisted until the final
//! submission, and there is no partial-save.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::finance::{self, FinanceError, DEFAULT_COEFFICIENT};
use crate::models::{CreateClient, CreateEquipmentLine, CreateOffer, OfferType};

/// Steps of the wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Client,
    Profile,
    Equipment,
    Financing,
    Preview,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Client => "client",
            WizardStep::Profile => "profile",
            WizardStep::Equipment => "equipment",
            WizardStep::Financing => "financing",
            WizardStep::Preview => "preview",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "profile" => WizardStep::Profile,
            "equipment" => WizardStep::Equipment,
            "financing" => WizardStep::Financing,
            "preview" => WizardStep::Preview,
            _ => WizardStep::Client,
        }
    }

    fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Client => Some(WizardStep::Profile),
            WizardStep::Profile => Some(WizardStep::Equipment),
            WizardStep::Equipment => Some(WizardStep::Financing),
            WizardStep::Financing => Some(WizardStep::Preview),
            WizardStep::Preview => None,
        }
    }

    fn previous(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Client => None,
            WizardStep::Profile => Some(WizardStep::Client),
            WizardStep::Equipment => Some(WizardStep::Profile),
            WizardStep::Financing => Some(WizardStep::Equipment),
            WizardStep::Preview => Some(WizardStep::Financing),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("step '{0}' is incomplete")]
    StepIncomplete(&'static str),
    #[error("already at the final step")]
    AtFinalStep,
    #[error("cannot skip ahead to step '{0}'")]
    CannotSkipAhead(&'static str),
    #[error("an offer can only be built from the preview step")]
    NotAtPreview,
    #[error(transparent)]
    Finance(#[from] FinanceError),
}

impl From<WizardError> for service_core::error::AppError {
    fn from(err: WizardError) -> Self {
        service_core::error::AppError::BadRequest(anyhow::anyhow!(err.to_string()))
    }
}

/// Accumulated wizard input. Also the shape of the `POST /offers/wizard`
/// payload, which re-runs every step validation server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WizardData {
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_company: String,
    #[serde(default)]
    pub business_profile: String,
    #[serde(default)]
    pub equipment: Vec<CreateEquipmentLine>,
    pub coefficient: Option<Decimal>,
    #[serde(default)]
    pub monthly_payment: Decimal,
    pub remarks: Option<String>,
}

/// What a completed wizard submits: one offer (equipment embedded) and,
/// when no existing client was selected, the client to create first.
#[derive(Debug, Clone)]
pub struct WizardSubmission {
    pub offer: CreateOffer,
    pub new_client: Option<CreateClient>,
}

/// Five-step offer wizard.
#[derive(Debug, Clone, Default)]
pub struct OfferWizard {
    step: Option<WizardStep>,
    data: WizardData,
}

impl OfferWizard {
    pub fn new() -> Self {
        OfferWizard {
            step: None,
            data: WizardData::default(),
        }
    }

    /// Wizard over already-accumulated data, used by the submission endpoint.
    pub fn with_data(data: WizardData) -> Self {
        OfferWizard { step: None, data }
    }

    pub fn current_step(&self) -> WizardStep {
        self.step.unwrap_or(WizardStep::Client)
    }

    pub fn data(&self) -> &WizardData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut WizardData {
        &mut self.data
    }

    /// Per-step validation predicate. Preview is always valid.
    pub fn validate_step(&self, step: WizardStep) -> bool {
        let data = &self.data;
        match step {
            WizardStep::Client => {
                data.client_id.is_some()
                    || (!data.client_name.trim().is_empty()
                        && !data.client_email.trim().is_empty()
                        && !data.client_company.trim().is_empty())
            }
            WizardStep::Profile => !data.business_profile.trim().is_empty(),
            WizardStep::Equipment => {
                !data.equipment.is_empty()
                    && data.equipment.iter().all(|line| {
                        line.purchase_price > Decimal::ZERO && line.quantity >= 1
                    })
            }
            WizardStep::Financing => {
                data.coefficient.unwrap_or(DEFAULT_COEFFICIENT) > Decimal::ZERO
                    && data.monthly_payment > Decimal::ZERO
            }
            WizardStep::Preview => true,
        }
    }

    /// Moves to the next step if the current one validates.
    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        let current = self.current_step();
        if !self.validate_step(current) {
            return Err(WizardError::StepIncomplete(current.as_str()));
        }
        let next = current.next().ok_or(WizardError::AtFinalStep)?;
        self.step = Some(next);
        Ok(next)
    }

    /// Moves back one step. No validation: earlier steps may always be
    /// revisited.
    pub fn back(&mut self) -> WizardStep {
        let current = self.current_step();
        let target = current.previous().unwrap_or(current);
        self.step = Some(target);
        target
    }

    /// Jumps to an earlier (or the current) step. Skipping ahead is refused.
    pub fn go_to(&mut self, step: WizardStep) -> Result<WizardStep, WizardError> {
        if step > self.current_step() {
            return Err(WizardError::CannotSkipAhead(step.as_str()));
        }
        self.step = Some(step);
        Ok(step)
    }

    /// Validates every step and assembles the submission. Only callable from
    /// the preview step.
    pub fn build(&self, offer_type: OfferType) -> Result<WizardSubmission, WizardError> {
        if self.current_step() != WizardStep::Preview {
            return Err(WizardError::NotAtPreview);
        }
        for step in [
            WizardStep::Client,
            WizardStep::Profile,
            WizardStep::Equipment,
            WizardStep::Financing,
        ] {
            if !self.validate_step(step) {
                return Err(WizardError::StepIncomplete(step.as_str()));
            }
        }

        let data = &self.data;
        let coefficient = data.coefficient.unwrap_or(DEFAULT_COEFFICIENT);
        let amount = finance::financed_amount(data.monthly_payment, coefficient)?;

        let new_client = if data.client_id.is_none() {
            Some(CreateClient {
                name: data.client_name.clone(),
                email: data.client_email.clone(),
                company_name: data.client_company.clone(),
                vat_number: None,
                address: None,
                city: None,
                postal_code: None,
                country: None,
            })
        } else {
            None
        };

        let offer = CreateOffer {
            client_id: data.client_id,
            client_name: data.client_name.clone(),
            client_email: data.client_email.clone(),
            amount,
            coefficient,
            monthly_payment: data.monthly_payment,
            commission: None,
            ambassador_id: None,
            offer_type,
            remarks: data.remarks.clone(),
            equipment: data.equipment.clone(),
        };

        Ok(WizardSubmission { offer, new_client })
    }
}
