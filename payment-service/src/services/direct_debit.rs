//! Direct-debit provider client.
//!
//! Implements the provider's Billing Request flow for mandate setup: create
//! a customer, create a mandate-only billing request, then create the hosted
//! flow the customer authorises in. Calls are JSON over HTTPS with a bearer
//! token and a pinned `GoCardless-Version` header.

use crate::config::DirectDebitConfig;
use crate::services::metrics::{record_environment_fallback, record_provider_call};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Provider environment. Tokens are issued per environment; presenting a
/// token to the wrong one yields HTTP 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Live,
}

impl Environment {
    /// The environment a mismatched token would belong to.
    pub fn other(self) -> Self {
        match self {
            Environment::Sandbox => Environment::Live,
            Environment::Live => Environment::Sandbox,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Live => "live",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sandbox" => Ok(Environment::Sandbox),
            "live" => Ok(Environment::Live),
            other => Err(format!(
                "Unknown environment '{}', expected 'sandbox' or 'live'",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed provider call. `request_id` is the provider's own id for the
/// request when the error body carried one, kept for support diagnosis.
#[derive(Debug)]
pub struct ProviderApiError {
    pub status: Option<StatusCode>,
    pub message: String,
    pub request_id: Option<String>,
}

impl ProviderApiError {
    fn is_forbidden(&self) -> bool {
        self.status == Some(StatusCode::FORBIDDEN)
    }
}

impl From<reqwest::Error> for ProviderApiError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
            request_id: None,
        }
    }
}

impl From<ProviderApiError> for AppError {
    fn from(err: ProviderApiError) -> Self {
        AppError::UpstreamError(err.message, err.request_id)
    }
}

// Request/response bodies. The provider wraps every resource in a
// same-named envelope key.

#[derive(Debug, Serialize)]
struct CustomerEnvelope {
    customers: NewCustomer,
}

#[derive(Debug, Serialize)]
struct NewCustomer {
    email: String,
    given_name: String,
    family_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    customers: Customer,
}

/// Customer record at the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
struct BillingRequestEnvelope {
    billing_requests: NewBillingRequest,
}

#[derive(Debug, Serialize)]
struct NewBillingRequest {
    mandate_request: MandateRequest,
    links: BillingRequestLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct MandateRequest {
    scheme: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct BillingRequestLinks {
    customer: String,
}

#[derive(Debug, Deserialize)]
struct BillingRequestResponse {
    billing_requests: BillingRequest,
}

/// Mandate-only billing request at the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingRequest {
    pub id: String,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
struct FlowEnvelope {
    billing_request_flows: NewFlow,
}

#[derive(Debug, Serialize)]
struct NewFlow {
    redirect_uri: String,
    exit_uri: String,
    links: FlowLinks,
}

#[derive(Debug, Serialize)]
struct FlowLinks {
    billing_request: String,
}

#[derive(Debug, Deserialize)]
struct FlowResponse {
    billing_request_flows: BillingRequestFlow,
}

/// Hosted authorisation flow for a billing request.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingRequestFlow {
    pub id: String,
    pub authorisation_url: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    error_type: Option<String>,
    request_id: Option<String>,
}

/// Who the mandate is for.
#[derive(Debug, Clone)]
pub struct MandateDetails {
    pub contract_id: Uuid,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub company_name: Option<String>,
}

/// Identifiers produced by a completed setup sequence, including the
/// environment the sequence actually succeeded against.
#[derive(Debug, Clone)]
pub struct MandateSetup {
    pub customer_id: String,
    pub billing_request_id: String,
    pub flow_id: String,
    pub authorisation_url: String,
    pub environment: Environment,
}

/// Direct-debit client for interacting with the provider API.
#[derive(Clone)]
pub struct DirectDebitClient {
    client: Client,
    config: DirectDebitConfig,
}

impl DirectDebitClient {
    /// Create a new direct-debit client.
    pub fn new(config: DirectDebitConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if the provider is configured (access token is set).
    pub fn is_configured(&self) -> bool {
        !self.config.access_token.expose_secret().is_empty()
    }

    async fn post<B, R>(
        &self,
        environment: Environment,
        path: &str,
        body: &B,
    ) -> Result<R, ProviderApiError>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url(environment), path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .header("GoCardless-Version", &self.config.version)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            status = %status,
            path = path,
            environment = %environment,
            "Provider response"
        );
        record_provider_call(path, environment.as_str(), status.as_u16());

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| ProviderApiError {
                status: Some(status),
                message: format!("Failed to decode provider response: {}", e),
                request_id: None,
            })
        } else {
            let detail = serde_json::from_str::<ProviderErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or_else(|_| ProviderErrorDetail {
                    message: text.clone(),
                    error_type: None,
                    request_id: None,
                });
            tracing::error!(
                status = %status,
                path = path,
                environment = %environment,
                message = %detail.message,
                request_id = detail.request_id.as_deref().unwrap_or("-"),
                "Provider call failed"
            );
            Err(ProviderApiError {
                status: Some(status),
                message: detail.message,
                request_id: detail.request_id,
            })
        }
    }

    /// Create a customer at the provider.
    pub async fn create_customer(
        &self,
        environment: Environment,
        details: &MandateDetails,
    ) -> Result<Customer, ProviderApiError> {
        let body = CustomerEnvelope {
            customers: NewCustomer {
                email: details.email.clone(),
                given_name: details.given_name.clone(),
                family_name: details.family_name.clone(),
                company_name: details.company_name.clone(),
            },
        };

        let response: CustomerResponse = self.post(environment, "/customers", &body).await?;
        tracing::info!(
            customer_id = %response.customers.id,
            environment = %environment,
            "Provider customer created"
        );
        Ok(response.customers)
    }

    /// Create a mandate-only billing request linked to a customer.
    pub async fn create_billing_request(
        &self,
        environment: Environment,
        customer_id: &str,
        contract_id: Uuid,
    ) -> Result<BillingRequest, ProviderApiError> {
        let body = BillingRequestEnvelope {
            billing_requests: NewBillingRequest {
                mandate_request: MandateRequest {
                    scheme: self.config.scheme.clone(),
                    currency: self.config.currency.clone(),
                },
                links: BillingRequestLinks {
                    customer: customer_id.to_string(),
                },
                metadata: Some(serde_json::json!({ "contract_id": contract_id })),
            },
        };

        let response: BillingRequestResponse =
            self.post(environment, "/billing_requests", &body).await?;
        tracing::info!(
            billing_request_id = %response.billing_requests.id,
            environment = %environment,
            "Billing request created"
        );
        Ok(response.billing_requests)
    }

    /// Create the hosted authorisation flow for a billing request.
    pub async fn create_billing_request_flow(
        &self,
        environment: Environment,
        billing_request_id: &str,
    ) -> Result<BillingRequestFlow, ProviderApiError> {
        let body = FlowEnvelope {
            billing_request_flows: NewFlow {
                redirect_uri: self.config.redirect_uri.clone(),
                exit_uri: self.config.exit_uri.clone(),
                links: FlowLinks {
                    billing_request: billing_request_id.to_string(),
                },
            },
        };

        let response: FlowResponse = self
            .post(environment, "/billing_request_flows", &body)
            .await?;
        tracing::info!(
            flow_id = %response.billing_request_flows.id,
            environment = %environment,
            "Billing request flow created"
        );
        Ok(response.billing_request_flows)
    }

    async fn run_sequence(
        &self,
        environment: Environment,
        details: &MandateDetails,
    ) -> Result<MandateSetup, ProviderApiError> {
        let customer = self.create_customer(environment, details).await?;
        let billing_request = self
            .create_billing_request(environment, &customer.id, details.contract_id)
            .await?;
        let flow = self
            .create_billing_request_flow(environment, &billing_request.id)
            .await?;

        Ok(MandateSetup {
            customer_id: customer.id,
            billing_request_id: billing_request.id,
            flow_id: flow.id,
            authorisation_url: flow.authorisation_url,
            environment,
        })
    }

    /// Run the full setup sequence: customer, billing request, flow.
    ///
    /// A 403 from any call means the token belongs to the other environment;
    /// the whole sequence is retried exactly once there. No other status is
    /// ever retried.
    pub async fn setup_mandate(&self, details: &MandateDetails) -> Result<MandateSetup, AppError> {
        if !self.is_configured() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Direct-debit access token not configured"
            )));
        }

        let primary = self.config.environment;
        match self.run_sequence(primary, details).await {
            Ok(setup) => Ok(setup),
            Err(err) if err.is_forbidden() => {
                let fallback = primary.other();
                tracing::warn!(
                    contract_id = %details.contract_id,
                    from = %primary,
                    to = %fallback,
                    "Provider returned 403, token does not match the configured environment; retrying once"
                );
                record_environment_fallback();
                self.run_sequence(fallback, details)
                    .await
                    .map_err(AppError::from)
            }
            Err(err) => Err(err.into()),
        }
    }
}
