//! Database service for company-service.

use crate::models::{
    ApiKey, Company, CreateCompany, UpdateBranding, UpdateCompany, UpdateModules,
    UpdateSubscriptionPeriod,
};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const COMPANY_COLUMNS: &str = "company_id, name, slug, is_active, plan, trial_ends_at, subscription_ends_at, modules_enabled, logo_url, primary_color, secondary_color, accent_color, created_utc, updated_utc";

const API_KEY_COLUMNS: &str =
    "key_id, company_id, name, key_digest, key_prefix, created_utc, last_used_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "company-service"))]
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
    // Company Operations
    // =========================================================================

    /// Register a new company. Slugs are unique across the platform.
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_company(&self, input: &CreateCompany) -> Result<Company, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_company"])
            .start_timer();

        let company_id = Uuid::new_v4();
        let result = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (company_id, name, slug, plan, trial_ends_at, subscription_ends_at, modules_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.plan)
        .bind(input.trial_ends_at)
        .bind(input.subscription_ends_at)
        .bind(&input.modules_enabled)
        .fetch_one(&self.pool)
        .await;

        let company = match result {
            Ok(company) => company,
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Slug '{}' is already taken",
                    input.slug
                )));
            }
            Err(e) => {
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to create company: {}",
                    e
                )));
            }
        };

        timer.observe_duration();
        info!(company_id = %company.company_id, slug = %company.slug, "Company registered");

        Ok(company)
    }

    /// Get a company by ID.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn get_company(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_company"])
            .start_timer();

        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE company_id = $1",
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get company: {}", e)))?;

        timer.observe_duration();

        Ok(company)
    }

    /// List companies, optionally filtered to a single slug.
    #[instrument(skip(self))]
    pub async fn list_companies(
        &self,
        slug: Option<&str>,
        page_size: i32,
        page_token: Option<Uuid>,
    ) -> Result<Vec<Company>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_companies"])
            .start_timer();

        let limit = page_size.clamp(1, 100) as i64;

        let companies = sqlx::query_as::<_, Company>(&format!(
            r#"
            SELECT {}
            FROM companies
            WHERE ($1::text IS NULL OR slug = $1)
              AND ($2::uuid IS NULL OR company_id > $2)
            ORDER BY company_id
            LIMIT $3
            "#,
            COMPANY_COLUMNS
        ))
        .bind(slug)
        .bind(page_token)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list companies: {}", e)))?;

        timer.observe_duration();

        Ok(companies)
    }

    /// Update a company's core fields.
    #[instrument(skip(self, input), fields(company_id = %company_id))]
    pub async fn update_company(
        &self,
        company_id: Uuid,
        input: &UpdateCompany,
    ) -> Result<Option<Company>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_company"])
            .start_timer();

        let result = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                plan = COALESCE($4, plan),
                updated_utc = NOW()
            WHERE company_id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.plan)
        .fetch_optional(&self.pool)
        .await;

        let company = match result {
            Ok(company) => company,
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Slug is already taken"
                )));
            }
            Err(e) => {
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to update company: {}",
                    e
                )));
            }
        };

        timer.observe_duration();

        Ok(company)
    }

    /// Flip the active flag. Deactivated companies derive `cancelled` on
    /// every subscription read until reactivated.
    #[instrument(skip(self), fields(company_id = %company_id, is_active = is_active))]
    pub async fn set_company_active(
        &self,
        company_id: Uuid,
        is_active: bool,
    ) -> Result<Option<Company>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_company_active"])
            .start_timer();

        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET is_active = $2, updated_utc = NOW()
            WHERE company_id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update active flag: {}", e))
        })?;

        timer.observe_duration();
        if let Some(ref company) = company {
            info!(company_id = %company.company_id, is_active = is_active, "Company active flag updated");
        }

        Ok(company)
    }

    /// Move the trial or subscription period. Explicit nulls clear a date,
    /// omitted fields are left untouched.
    #[instrument(skip(self, input), fields(company_id = %company_id))]
    pub async fn update_subscription_period(
        &self,
        company_id: Uuid,
        input: &UpdateSubscriptionPeriod,
    ) -> Result<Option<Company>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_subscription_period"])
            .start_timer();

        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET trial_ends_at = CASE WHEN $2 THEN $3 ELSE trial_ends_at END,
                subscription_ends_at = CASE WHEN $4 THEN $5 ELSE subscription_ends_at END,
                plan = COALESCE($6, plan),
                updated_utc = NOW()
            WHERE company_id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .bind(input.trial_ends_at.is_some())
        .bind(input.trial_ends_at.flatten())
        .bind(input.subscription_ends_at.is_some())
        .bind(input.subscription_ends_at.flatten())
        .bind(&input.plan)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to update subscription period: {}",
                e
            ))
        })?;

        timer.observe_duration();

        Ok(company)
    }

    /// Replace the enabled-modules list.
    #[instrument(skip(self, input), fields(company_id = %company_id))]
    pub async fn update_modules(
        &self,
        company_id: Uuid,
        input: &UpdateModules,
    ) -> Result<Option<Company>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_modules"])
            .start_timer();

        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET modules_enabled = $2, updated_utc = NOW()
            WHERE company_id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .bind(&input.modules_enabled)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update modules: {}", e)))?;

        timer.observe_duration();

        Ok(company)
    }

    /// Update the branding theme.
    #[instrument(skip(self, input), fields(company_id = %company_id))]
    pub async fn update_branding(
        &self,
        company_id: Uuid,
        input: &UpdateBranding,
    ) -> Result<Option<Company>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_branding"])
            .start_timer();

        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET logo_url = COALESCE($2, logo_url),
                primary_color = COALESCE($3, primary_color),
                secondary_color = COALESCE($4, secondary_color),
                accent_color = COALESCE($5, accent_color),
                updated_utc = NOW()
            WHERE company_id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .bind(&input.logo_url)
        .bind(&input.primary_color)
        .bind(&input.secondary_color)
        .bind(&input.accent_color)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update branding: {}", e))
        })?;

        timer.observe_duration();

        Ok(company)
    }

    /// Delete a company. API keys go with it.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn delete_company(&self, company_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_company"])
            .start_timer();

        let result = sqlx::query("DELETE FROM companies WHERE company_id = $1")
            .bind(company_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete company: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // API Key Operations
    // =========================================================================

    /// Store an issued key's digest.
    #[instrument(skip(self, key_digest), fields(company_id = %company_id))]
    pub async fn create_api_key(
        &self,
        company_id: Uuid,
        name: &str,
        key_digest: &str,
        key_prefix: &str,
    ) -> Result<ApiKey, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_api_key"])
            .start_timer();

        let key_id = Uuid::new_v4();
        let key = sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            INSERT INTO api_keys (key_id, company_id, name, key_digest, key_prefix)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            API_KEY_COLUMNS
        ))
        .bind(key_id)
        .bind(company_id)
        .bind(name)
        .bind(key_digest)
        .bind(key_prefix)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to store API key: {}", e)))?;

        timer.observe_duration();
        info!(key_id = %key.key_id, company_id = %company_id, "API key issued");

        Ok(key)
    }

    /// List a company's keys.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list_api_keys(&self, company_id: Uuid) -> Result<Vec<ApiKey>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_api_keys"])
            .start_timer();

        let keys = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {} FROM api_keys WHERE company_id = $1 ORDER BY created_utc",
            API_KEY_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list API keys: {}", e)))?;

        timer.observe_duration();

        Ok(keys)
    }

    /// Revoke a key.
    #[instrument(skip(self), fields(company_id = %company_id, key_id = %key_id))]
    pub async fn delete_api_key(&self, company_id: Uuid, key_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_api_key"])
            .start_timer();

        let result = sqlx::query("DELETE FROM api_keys WHERE company_id = $1 AND key_id = $2")
            .bind(company_id)
            .bind(key_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to revoke API key: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }
}
