//! Provider-client tests against a wiremock server. No database required.

use payment_service::config::DirectDebitConfig;
use payment_service::services::direct_debit::{DirectDebitClient, Environment, MandateDetails};
use secrecy::Secret;
use service_core::error::AppError;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_config(sandbox_url: &str, live_url: &str) -> DirectDebitConfig {
    DirectDebitConfig {
        access_token: Secret::new("test_token".to_string()),
        environment: Environment::Sandbox,
        sandbox_base_url: sandbox_url.to_string(),
        live_base_url: live_url.to_string(),
        version: "2015-07-06".to_string(),
        scheme: "sepa_core".to_string(),
        currency: "EUR".to_string(),
        redirect_uri: "https://app.example.com/return".to_string(),
        exit_uri: "https://app.example.com/exit".to_string(),
    }
}

fn mandate_details() -> MandateDetails {
    MandateDetails {
        contract_id: Uuid::new_v4(),
        email: "anna@acme.example".to_string(),
        given_name: "Anna".to_string(),
        family_name: "Durand".to_string(),
        company_name: Some("Acme SPRL".to_string()),
    }
}

fn customer_created(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "customers": { "id": id, "email": "anna@acme.example" }
    }))
}

fn billing_request_created(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "billing_requests": { "id": id, "status": "pending" }
    }))
}

fn flow_created(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "billing_request_flows": {
            "id": id,
            "authorisation_url": format!("https://pay.example.com/flows/{}", id)
        }
    }))
}

fn provider_error(status: u16, message: &str, request_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "error": {
            "message": message,
            "type": "invalid_api_usage",
            "code": status,
            "request_id": request_id
        }
    }))
}

/// Mount the full success sequence on a server without call-count assertions.
async fn mount_success_sequence(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(customer_created("CU123"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/billing_requests"))
        .respond_with(billing_request_created("BRQ123"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/billing_request_flows"))
        .respond_with(flow_created("BRF123"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn setup_runs_the_three_call_sequence() {
    let sandbox = MockServer::start().await;
    let live = MockServer::start().await;
    let details = mandate_details();

    Mock::given(method("POST"))
        .and(path("/customers"))
        .and(header("Authorization", "Bearer test_token"))
        .and(header("GoCardless-Version", "2015-07-06"))
        .and(body_partial_json(serde_json::json!({
            "customers": {
                "email": "anna@acme.example",
                "given_name": "Anna",
                "family_name": "Durand",
                "company_name": "Acme SPRL"
            }
        })))
        .respond_with(customer_created("CU123"))
        .expect(1)
        .mount(&sandbox)
        .await;

    Mock::given(method("POST"))
        .and(path("/billing_requests"))
        .and(body_partial_json(serde_json::json!({
            "billing_requests": {
                "mandate_request": { "scheme": "sepa_core", "currency": "EUR" },
                "links": { "customer": "CU123" },
                "metadata": { "contract_id": details.contract_id.to_string() }
            }
        })))
        .respond_with(billing_request_created("BRQ123"))
        .expect(1)
        .mount(&sandbox)
        .await;

    Mock::given(method("POST"))
        .and(path("/billing_request_flows"))
        .and(body_partial_json(serde_json::json!({
            "billing_request_flows": {
                "redirect_uri": "https://app.example.com/return",
                "exit_uri": "https://app.example.com/exit",
                "links": { "billing_request": "BRQ123" }
            }
        })))
        .respond_with(flow_created("BRF123"))
        .expect(1)
        .mount(&sandbox)
        .await;

    let client = DirectDebitClient::new(provider_config(&sandbox.uri(), &live.uri()));
    let setup = client
        .setup_mandate(&details)
        .await
        .expect("setup should succeed");

    assert_eq!(setup.customer_id, "CU123");
    assert_eq!(setup.billing_request_id, "BRQ123");
    assert_eq!(setup.flow_id, "BRF123");
    assert_eq!(setup.authorisation_url, "https://pay.example.com/flows/BRF123");
    assert_eq!(setup.environment, Environment::Sandbox);
}

#[tokio::test]
async fn a_403_retries_the_whole_sequence_on_the_other_environment() {
    let sandbox = MockServer::start().await;
    let live = MockServer::start().await;

    // Sandbox accepts the customer but rejects the billing request: the
    // retry must start over from the customer on the live side.
    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(customer_created("CU-SANDBOX"))
        .expect(1)
        .mount(&sandbox)
        .await;
    Mock::given(method("POST"))
        .and(path("/billing_requests"))
        .respond_with(provider_error(
            403,
            "Token is for a different environment",
            "REQ-403",
        ))
        .expect(1)
        .mount(&sandbox)
        .await;

    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(customer_created("CU-LIVE"))
        .expect(1)
        .mount(&live)
        .await;
    Mock::given(method("POST"))
        .and(path("/billing_requests"))
        .and(body_partial_json(serde_json::json!({
            "billing_requests": { "links": { "customer": "CU-LIVE" } }
        })))
        .respond_with(billing_request_created("BRQ-LIVE"))
        .expect(1)
        .mount(&live)
        .await;
    Mock::given(method("POST"))
        .and(path("/billing_request_flows"))
        .respond_with(flow_created("BRF-LIVE"))
        .expect(1)
        .mount(&live)
        .await;

    let client = DirectDebitClient::new(provider_config(&sandbox.uri(), &live.uri()));
    let setup = client
        .setup_mandate(&mandate_details())
        .await
        .expect("fallback should succeed");

    assert_eq!(setup.customer_id, "CU-LIVE");
    assert_eq!(setup.environment, Environment::Live);
}

#[tokio::test]
async fn forbidden_in_both_environments_fails_without_a_second_retry() {
    let sandbox = MockServer::start().await;
    let live = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(provider_error(403, "Forbidden request", "REQ-42"))
        .expect(1)
        .mount(&sandbox)
        .await;
    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(provider_error(403, "Forbidden request", "REQ-43"))
        .expect(1)
        .mount(&live)
        .await;

    let client = DirectDebitClient::new(provider_config(&sandbox.uri(), &live.uri()));
    let err = client
        .setup_mandate(&mandate_details())
        .await
        .expect_err("both environments rejected the token");

    match err {
        AppError::UpstreamError(message, request_id) => {
            assert_eq!(message, "Forbidden request");
            assert_eq!(request_id.as_deref(), Some("REQ-43"));
        }
        other => panic!("Expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn non_403_errors_are_never_retried() {
    let sandbox = MockServer::start().await;
    let live = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(provider_error(422, "Email is invalid", "REQ-9"))
        .expect(1)
        .mount(&sandbox)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&live)
        .await;

    let client = DirectDebitClient::new(provider_config(&sandbox.uri(), &live.uri()));
    let err = client
        .setup_mandate(&mandate_details())
        .await
        .expect_err("validation errors should surface directly");

    match err {
        AppError::UpstreamError(message, request_id) => {
            assert_eq!(message, "Email is invalid");
            assert_eq!(request_id.as_deref(), Some("REQ-9"));
        }
        other => panic!("Expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn an_unconfigured_client_fails_before_any_call() {
    let sandbox = MockServer::start().await;
    let live = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&sandbox)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&live)
        .await;

    let mut config = provider_config(&sandbox.uri(), &live.uri());
    config.access_token = Secret::new("".to_string());

    let client = DirectDebitClient::new(config);
    let err = client
        .setup_mandate(&mandate_details())
        .await
        .expect_err("an empty token cannot reach the provider");

    assert!(matches!(err, AppError::ConfigError(_)));
}

#[tokio::test]
async fn a_live_configuration_falls_back_to_sandbox() {
    let sandbox = MockServer::start().await;
    let live = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/customers"))
        .respond_with(provider_error(403, "Forbidden request", "REQ-1"))
        .expect(1)
        .mount(&live)
        .await;
    mount_success_sequence(&sandbox).await;

    let mut config = provider_config(&sandbox.uri(), &live.uri());
    config.environment = Environment::Live;

    let client = DirectDebitClient::new(config);
    let setup = client
        .setup_mandate(&mandate_details())
        .await
        .expect("fallback should succeed");

    assert_eq!(setup.environment, Environment::Sandbox);
    assert_eq!(setup.customer_id, "CU123");
}
