//! Database service for document-service.
//!
//! The offers, clients and equipment tables are owned by offer-service and
//! the companies table by company-service; this service carries no
//! migrations of its own and only reads what it lays out.

use crate::models::{ClientDetails, CompanyBranding, EquipmentLine, OfferDocument};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const OFFER_COLUMNS: &str = "offer_id, company_id, client_id, client_name, client_email, \
     amount, coefficient, monthly_payment, status, workflow_status, remarks, \
     signed_at, signer_name, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "document-service"))]
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

    /// Offer row for the document header and totals.
    #[instrument(skip(self), fields(offer_id = %offer_id))]
    pub async fn get_offer_document(
        &self,
        offer_id: Uuid,
    ) -> Result<Option<OfferDocument>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_offer_document"])
            .start_timer();

        let offer = sqlx::query_as::<_, OfferDocument>(&format!(
            "SELECT {} FROM offers WHERE offer_id = $1",
            OFFER_COLUMNS
        ))
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get offer: {}", e)))?;

        timer.observe_duration();

        Ok(offer)
    }

    /// Client address block for the document.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn get_client_details(
        &self,
        client_id: Uuid,
    ) -> Result<Option<ClientDetails>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_client_details"])
            .start_timer();

        let client = sqlx::query_as::<_, ClientDetails>(
            "SELECT name, email, company_name, vat_number, address, city, postal_code, country
             FROM clients WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get client: {}", e)))?;

        timer.observe_duration();

        Ok(client)
    }

    /// Issuing company name and branding colors.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn get_company_branding(
        &self,
        company_id: Uuid,
    ) -> Result<Option<CompanyBranding>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_company_branding"])
            .start_timer();

        let company = sqlx::query_as::<_, CompanyBranding>(
            "SELECT name, logo_url, primary_color, secondary_color, accent_color
             FROM companies WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get company: {}", e)))?;

        timer.observe_duration();

        Ok(company)
    }

    /// Equipment lines of an offer in insertion order.
    #[instrument(skip(self), fields(offer_id = %offer_id))]
    pub async fn list_equipment(&self, offer_id: Uuid) -> Result<Vec<EquipmentLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_equipment"])
            .start_timer();

        let lines = sqlx::query_as::<_, EquipmentLine>(
            "SELECT title, purchase_price, quantity, margin_percent, monthly_payment_total
             FROM offer_equipment WHERE offer_id = $1 ORDER BY created_utc",
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list equipment: {}", e)))?;

        timer.observe_duration();

        Ok(lines)
    }
}
