//! Database service for payment-service.
//!
//! The contracts and clients tables are owned by offer-service; this service
//! carries no migrations of its own and only reads contract billing details
//! and writes mandate identifiers back.

use crate::services::direct_debit::MandateSetup;
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Contract row joined with its client, as needed for customer creation.
#[derive(Debug, Clone, FromRow)]
pub struct ContractBilling {
    pub contract_id: Uuid,
    pub company_id: Uuid,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_company: Option<String>,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "payment-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Contract billing details for mandate setup. `client_email` is NULL
    /// when the contract's client row was deleted.
    #[instrument(skip(self), fields(contract_id = %contract_id))]
    pub async fn get_contract_billing(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<ContractBilling>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_contract_billing"])
            .start_timer();

        let billing = sqlx::query_as::<_, ContractBilling>(
            r#"
            SELECT co.contract_id,
                   co.company_id,
                   co.client_name,
                   cl.email AS client_email,
                   cl.company_name AS client_company
            FROM contracts co
            LEFT JOIN clients cl ON cl.client_id = co.client_id
            WHERE co.contract_id = $1
            "#,
        )
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get contract billing: {}", e))
        })?;

        timer.observe_duration();

        Ok(billing)
    }

    /// Persist the identifiers of a completed mandate setup onto the
    /// contract row.
    #[instrument(skip(self, setup), fields(contract_id = %contract_id))]
    pub async fn update_mandate_ids(
        &self,
        contract_id: Uuid,
        setup: &MandateSetup,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_mandate_ids"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET dd_customer_id = $2,
                dd_billing_request_id = $3,
                dd_flow_id = $4,
                dd_authorisation_url = $5,
                updated_utc = NOW()
            WHERE contract_id = $1
            "#,
        )
        .bind(contract_id)
        .bind(&setup.customer_id)
        .bind(&setup.billing_request_id)
        .bind(&setup.flow_id)
        .bind(&setup.authorisation_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update mandate ids: {}", e))
        })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }
}
