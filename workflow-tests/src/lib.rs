//! Cross-service workflow integration tests library.
//!
//! Provides test infrastructure for running end-to-end tests across multiple microservices.
//! Tests drive the running services over HTTP and verify complete business workflows.
//!
//! ## Usage
//!
//! ```bash
//! # Start PostgreSQL and all six services, then
//! cargo test -p workflow-tests -- --ignored
//! ```

use anyhow::{anyhow, Result};
use std::sync::Once;
use std::time::Duration;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Service base URL configuration from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub offer: String,
    pub company: String,
    pub catalog: String,
    pub notification: String,
    pub payment: String,
    pub document: String,
}

impl ServiceEndpoints {
    /// Load endpoints from environment variables or use defaults.
    pub fn from_env() -> Self {
        Self {
            offer: std::env::var("OFFER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9001".to_string()),
            company: std::env::var("COMPANY_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9002".to_string()),
            catalog: std::env::var("CATALOG_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9003".to_string()),
            notification: std::env::var("NOTIFICATION_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9004".to_string()),
            payment: std::env::var("PAYMENT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9005".to_string()),
            document: std::env::var("DOCUMENT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9006".to_string()),
        }
    }

    /// Get health check URLs for all services.
    pub fn health_urls(&self) -> Vec<(&'static str, String)> {
        vec![
            ("offer", format!("{}/health", self.offer)),
            ("company", format!("{}/health", self.company)),
            ("catalog", format!("{}/health", self.catalog)),
            ("notification", format!("{}/health", self.notification)),
            ("payment", format!("{}/health", self.payment)),
            ("document", format!("{}/health", self.document)),
        ]
    }
}

/// Context for workflow tests.
///
/// Each test should create a new context with its own company for isolation.
pub struct WorkflowTestContext {
    /// Tenant the test operates as. Tests that need real company rows
    /// register one in company-service and adopt its id.
    pub company_id: Uuid,
    /// Acting user forwarded to offer-service for audit fields.
    pub user_email: String,
    pub http: reqwest::Client,
    pub endpoints: ServiceEndpoints,
}

impl WorkflowTestContext {
    /// Create a new workflow test context.
    ///
    /// This creates a unique company ID for test isolation but does NOT
    /// register the company in company-service (tests can do this if needed).
    pub fn new() -> Result<Self> {
        init_tracing();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            company_id: Uuid::new_v4(),
            user_email: "workflow-tests@leazr.example".to_string(),
            http,
            endpoints: ServiceEndpoints::from_env(),
        })
    }

    /// Add the tenant headers offer-service expects from the gateway.
    pub fn with_tenant(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Company-ID", self.company_id.to_string())
            .header("X-User-Email", &self.user_email)
    }
}

/// Wait for all services to be healthy.
///
/// Polls health endpoints until all services respond with 200 OK.
/// Times out after the specified duration.
pub async fn wait_for_services(timeout: Duration) -> Result<()> {
    let endpoints = ServiceEndpoints::from_env();
    let health_urls = endpoints.health_urls();
    let client = reqwest::Client::new();
    let start = std::time::Instant::now();

    tracing::info!("Waiting for {} services to be healthy...", health_urls.len());

    loop {
        let mut all_healthy = true;
        let mut unhealthy_services = Vec::new();

        for (name, url) in &health_urls {
            match client.get(url).timeout(Duration::from_secs(2)).send().await {
                Ok(resp) if resp.status().is_success() => {
                    // Service is healthy
                }
                Ok(resp) => {
                    all_healthy = false;
                    unhealthy_services.push(format!("{} (status: {})", name, resp.status()));
                }
                Err(e) => {
                    all_healthy = false;
                    unhealthy_services.push(format!("{} (error: {})", name, e));
                }
            }
        }

        if all_healthy {
            tracing::info!("All services are healthy");
            return Ok(());
        }

        if start.elapsed() > timeout {
            return Err(anyhow!(
                "Timeout waiting for services. Unhealthy: {}",
                unhealthy_services.join(", ")
            ));
        }

        tracing::debug!("Waiting for services: {}", unhealthy_services.join(", "));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
