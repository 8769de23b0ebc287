//! Common test utilities for workflow integration tests.

use std::time::Duration;
use workflow_tests::{wait_for_services, WorkflowTestContext};

/// Default timeout for waiting on services.
pub const SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

/// Create a new workflow test context, ensuring services are healthy.
///
/// This is the main entry point for workflow tests.
pub async fn setup() -> WorkflowTestContext {
    // Wait for all services to be healthy
    wait_for_services(SERVICE_TIMEOUT)
        .await
        .expect("Services not healthy - start PostgreSQL and the six services first");

    WorkflowTestContext::new().expect("Failed to create workflow test context")
}
