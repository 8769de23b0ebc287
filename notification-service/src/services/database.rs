//! Database service for notification-service.
//!
//! Owns the notifications table; the offers and offer_equipment tables it
//! reads for template data belong to offer-service.

use crate::models::{NotificationRecord, NotificationStatus, OfferEmail, OfferEquipmentLine};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str = "notification_id, channel, template, status, recipient, subject, offer_id, has_attachment, provider_id, error_message, created_utc, sent_utc, failed_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "notification-service"))]
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

    /// Run database migrations.
    ///
    /// The platform database is shared across services; each service owns a
    /// disjoint version range and skips rows applied by the others.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Notification Rows
    // =========================================================================

    /// Insert a pending notification row.
    #[instrument(skip(self, record), fields(notification_id = %record.notification_id))]
    pub async fn insert_notification(&self, record: &NotificationRecord) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_notification"])
            .start_timer();

        sqlx::query(
            "INSERT INTO notifications (notification_id, channel, template, status, recipient, subject, offer_id, has_attachment)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.notification_id)
        .bind(&record.channel)
        .bind(&record.template)
        .bind(&record.status)
        .bind(&record.recipient)
        .bind(&record.subject)
        .bind(record.offer_id)
        .bind(record.has_attachment)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert notification: {}", e))
        })?;

        timer.observe_duration();
        info!(
            notification_id = %record.notification_id,
            template = %record.template,
            "Notification recorded"
        );

        Ok(())
    }

    /// Mark a notification row sent.
    #[instrument(skip(self), fields(notification_id = %notification_id))]
    pub async fn mark_notification_sent(
        &self,
        notification_id: Uuid,
        provider_id: Option<&str>,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_notification_sent"])
            .start_timer();

        sqlx::query(
            "UPDATE notifications SET status = $2, provider_id = $3, sent_utc = NOW()
             WHERE notification_id = $1",
        )
        .bind(notification_id)
        .bind(NotificationStatus::Sent.as_str())
        .bind(provider_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update notification: {}", e))
        })?;

        timer.observe_duration();
        Ok(())
    }

    /// Mark a notification row failed with the provider's error.
    #[instrument(skip(self, error), fields(notification_id = %notification_id))]
    pub async fn mark_notification_failed(
        &self,
        notification_id: Uuid,
        error: &str,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_notification_failed"])
            .start_timer();

        sqlx::query(
            "UPDATE notifications SET status = $2, error_message = $3, failed_utc = NOW()
             WHERE notification_id = $1",
        )
        .bind(notification_id)
        .bind(NotificationStatus::Failed.as_str())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update notification: {}", e))
        })?;

        timer.observe_duration();
        Ok(())
    }

    /// Get a notification row by id.
    #[instrument(skip(self), fields(notification_id = %notification_id))]
    pub async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<NotificationRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_notification"])
            .start_timer();

        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT {} FROM notifications WHERE notification_id = $1",
            NOTIFICATION_COLUMNS
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get notification: {}", e))
        })?;

        timer.observe_duration();
        Ok(record)
    }

    // =========================================================================
    // Offer Reads (offer-service's tables)
    // =========================================================================

    /// Load the slice of an offer the templates render.
    #[instrument(skip(self), fields(offer_id = %offer_id))]
    pub async fn get_offer_email(&self, offer_id: Uuid) -> Result<Option<OfferEmail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_offer_email"])
            .start_timer();

        let offer = sqlx::query_as::<_, OfferEmail>(
            "SELECT offer_id, company_id, client_name, client_email, amount, monthly_payment, signed_at, signer_name
             FROM offers WHERE offer_id = $1",
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get offer: {}", e)))?;

        timer.observe_duration();
        Ok(offer)
    }

    /// Equipment lines of an offer, in creation order.
    #[instrument(skip(self), fields(offer_id = %offer_id))]
    pub async fn list_offer_equipment(
        &self,
        offer_id: Uuid,
    ) -> Result<Vec<OfferEquipmentLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_offer_equipment"])
            .start_timer();

        let lines = sqlx::query_as::<_, OfferEquipmentLine>(
            "SELECT title, quantity, monthly_payment_total
             FROM offer_equipment WHERE offer_id = $1 ORDER BY created_utc",
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list offer equipment: {}", e))
        })?;

        timer.observe_duration();
        Ok(lines)
    }
}
