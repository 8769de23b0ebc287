//! Database service for offer-service.

use crate::finance::{self, EquipmentTotals};
use crate::models::{
    group_equipment, AssignmentRecord, Client, Collaborator, CollaboratorGroup, Contract,
    ContractStatus, CreateClient, CreateCollaborator, CreateContract, CreateEquipmentLine,
    CreateOffer, EquipmentLine, ListContractsFilter, ListOffersFilter, Offer, OfferStatus,
    ParentType, UpdateClient, UpdateCollaborator, UpdateEquipmentLine, UpdateOffer, WorkflowStatus,
};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const OFFER_COLUMNS: &str = "offer_id, company_id, client_id, client_name, client_email, amount, coefficient, monthly_payment, commission, ambassador_id, status, workflow_status, offer_type, remarks, signed_at, signer_name, created_utc, updated_utc";

const CONTRACT_COLUMNS: &str = "contract_id, company_id, offer_id, client_id, client_name, monthly_payment, leaser_name, status, dd_customer_id, dd_billing_request_id, dd_flow_id, dd_authorisation_url, created_utc, updated_utc";

const CLIENT_COLUMNS: &str = "client_id, company_id, name, email, company_name, vat_number, address, city, postal_code, country, created_utc, updated_utc";

const COLLABORATOR_COLUMNS: &str =
    "collaborator_id, client_id, name, email, role, is_primary, created_utc, updated_utc";

/// Table and columns backing one equipment parent type.
fn equipment_table(parent_type: ParentType) -> (&'static str, &'static str) {
    match parent_type {
        ParentType::Offer => ("offer_equipment", "offer_id"),
        ParentType::Contract => ("contract_equipment", "contract_id"),
    }
}

/// Select list exposing the owning table as `parent_id` + `parent_type`.
fn equipment_columns(parent_type: ParentType) -> String {
    let (_, parent_col) = equipment_table(parent_type);
    format!(
        "equipment_id, {} AS parent_id, '{}'::text AS parent_type, title, purchase_price, quantity, margin_percent, monthly_payment_total, serial_number, attributes, specifications, delivery_type, delivery_collaborator_id, delivery_site_id, delivery_address, delivery_city, delivery_postal_code, delivery_country, delivery_contact_name, delivery_contact_email, collaborator_id, created_utc, updated_utc",
        parent_col,
        parent_type.as_str()
    )
}

fn equipment_insert_sql(parent_type: ParentType) -> String {
    let (table, parent_col) = equipment_table(parent_type);
    format!(
        "INSERT INTO {} (equipment_id, {}, title, purchase_price, quantity, margin_percent, monthly_payment_total, serial_number, attributes, specifications, delivery_type, delivery_collaborator_id, delivery_site_id, delivery_address, delivery_city, delivery_postal_code, delivery_country, delivery_contact_name, delivery_contact_email)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
         RETURNING {}",
        table,
        parent_col,
        equipment_columns(parent_type)
    )
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "offer-service"))]
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
    // Client Operations
    // =========================================================================

    /// Create a new client.
    #[instrument(skip(self, input), fields(company_id = %company_id))]
    pub async fn create_client(
        &self,
        company_id: Uuid,
        input: &CreateClient,
    ) -> Result<Client, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_client"])
            .start_timer();

        let client_id = Uuid::new_v4();
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (client_id, company_id, name, email, company_name, vat_number, address, city, postal_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(client_id)
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.company_name)
        .bind(&input.vat_number)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(&input.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create client: {}", e)))?;

        timer.observe_duration();
        info!(client_id = %client.client_id, name = %client.name, "Client created");

        Ok(client)
    }

    /// Get a client by ID.
    #[instrument(skip(self), fields(company_id = %company_id, client_id = %client_id))]
    pub async fn get_client(
        &self,
        company_id: Uuid,
        client_id: Uuid,
    ) -> Result<Option<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_client"])
            .start_timer();

        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE company_id = $1 AND client_id = $2",
            CLIENT_COLUMNS
        ))
        .bind(company_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get client: {}", e)))?;

        timer.observe_duration();

        Ok(client)
    }

    /// List clients for a company.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list_clients(
        &self,
        company_id: Uuid,
        page_size: i32,
        page_token: Option<Uuid>,
    ) -> Result<Vec<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_clients"])
            .start_timer();

        let limit = page_size.clamp(1, 100) as i64;

        let clients = sqlx::query_as::<_, Client>(&format!(
            r#"
            SELECT {}
            FROM clients
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR client_id > $2)
            ORDER BY client_id
            LIMIT $3
            "#,
            CLIENT_COLUMNS
        ))
        .bind(company_id)
        .bind(page_token)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list clients: {}", e)))?;

        timer.observe_duration();

        Ok(clients)
    }

    /// Update a client.
    #[instrument(skip(self, input), fields(company_id = %company_id, client_id = %client_id))]
    pub async fn update_client(
        &self,
        company_id: Uuid,
        client_id: Uuid,
        input: &UpdateClient,
    ) -> Result<Option<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_client"])
            .start_timer();

        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                company_name = COALESCE($5, company_name),
                vat_number = COALESCE($6, vat_number),
                address = COALESCE($7, address),
                city = COALESCE($8, city),
                postal_code = COALESCE($9, postal_code),
                country = COALESCE($10, country),
                updated_utc = NOW()
            WHERE company_id = $1 AND client_id = $2
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(company_id)
        .bind(client_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.company_name)
        .bind(&input.vat_number)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .bind(&input.country)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update client: {}", e)))?;

        timer.observe_duration();

        Ok(client)
    }

    /// Delete a client and everything hanging off it.
    #[instrument(skip(self), fields(company_id = %company_id, client_id = %client_id))]
    pub async fn delete_client(
        &self,
        company_id: Uuid,
        client_id: Uuid,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_client"])
            .start_timer();

        let result = sqlx::query("DELETE FROM clients WHERE company_id = $1 AND client_id = $2")
            .bind(company_id)
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete client: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Collaborator Operations
    // =========================================================================

    /// Create a collaborator. Setting `is_primary` demotes the previous
    /// primary in the same transaction so at most one remains.
    #[instrument(skip(self, input), fields(client_id = %client_id))]
    pub async fn create_collaborator(
        &self,
        client_id: Uuid,
        input: &CreateCollaborator,
    ) -> Result<Collaborator, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_collaborator"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if input.is_primary {
            sqlx::query(
                "UPDATE collaborators SET is_primary = FALSE, updated_utc = NOW() WHERE client_id = $1 AND is_primary = TRUE",
            )
            .bind(client_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to demote primary: {}", e))
            })?;
        }

        let collaborator_id = Uuid::new_v4();
        let collaborator = sqlx::query_as::<_, Collaborator>(&format!(
            r#"
            INSERT INTO collaborators (collaborator_id, client_id, name, email, role, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COLLABORATOR_COLUMNS
        ))
        .bind(collaborator_id)
        .bind(client_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.role)
        .bind(input.is_primary)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create collaborator: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(collaborator_id = %collaborator.collaborator_id, "Collaborator created");

        Ok(collaborator)
    }

    /// Get a collaborator by ID.
    #[instrument(skip(self), fields(collaborator_id = %collaborator_id))]
    pub async fn get_collaborator(
        &self,
        collaborator_id: Uuid,
    ) -> Result<Option<Collaborator>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_collaborator"])
            .start_timer();

        let collaborator = sqlx::query_as::<_, Collaborator>(&format!(
            "SELECT {} FROM collaborators WHERE collaborator_id = $1",
            COLLABORATOR_COLUMNS
        ))
        .bind(collaborator_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get collaborator: {}", e))
        })?;

        timer.observe_duration();

        Ok(collaborator)
    }

    /// List a client's collaborators, primary first.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn list_collaborators(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<Collaborator>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_collaborators"])
            .start_timer();

        let collaborators = sqlx::query_as::<_, Collaborator>(&format!(
            r#"
            SELECT {}
            FROM collaborators
            WHERE client_id = $1
            ORDER BY is_primary DESC, name
            "#,
            COLLABORATOR_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list collaborators: {}", e))
        })?;

        timer.observe_duration();

        Ok(collaborators)
    }

    /// Update a collaborator, keeping the one-primary-per-client rule.
    #[instrument(skip(self, input), fields(collaborator_id = %collaborator_id))]
    pub async fn update_collaborator(
        &self,
        collaborator_id: Uuid,
        input: &UpdateCollaborator,
    ) -> Result<Option<Collaborator>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_collaborator"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if input.is_primary == Some(true) {
            sqlx::query(
                r#"
                UPDATE collaborators SET is_primary = FALSE, updated_utc = NOW()
                WHERE is_primary = TRUE
                  AND collaborator_id <> $1
                  AND client_id = (SELECT client_id FROM collaborators WHERE collaborator_id = $1)
                "#,
            )
            .bind(collaborator_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to demote primary: {}", e))
            })?;
        }

        let collaborator = sqlx::query_as::<_, Collaborator>(&format!(
            r#"
            UPDATE collaborators
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                is_primary = COALESCE($5, is_primary),
                updated_utc = NOW()
            WHERE collaborator_id = $1
            RETURNING {}
            "#,
            COLLABORATOR_COLUMNS
        ))
        .bind(collaborator_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.role)
        .bind(input.is_primary)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update collaborator: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        Ok(collaborator)
    }

    /// Delete a collaborator. Equipment assigned to them reverts to
    /// unassigned; history rows keep the dangling id for the audit trail.
    #[instrument(skip(self), fields(collaborator_id = %collaborator_id))]
    pub async fn delete_collaborator(&self, collaborator_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_collaborator"])
            .start_timer();

        let result = sqlx::query("DELETE FROM collaborators WHERE collaborator_id = $1")
            .bind(collaborator_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete collaborator: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Offer Operations
    // =========================================================================

    /// Create an offer with its equipment lines in one transaction.
    #[instrument(skip(self, input), fields(company_id = %company_id))]
    pub async fn create_offer(
        &self,
        company_id: Uuid,
        input: &CreateOffer,
    ) -> Result<(Offer, Vec<EquipmentLine>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_offer"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let offer_id = Uuid::new_v4();
        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            INSERT INTO offers (offer_id, company_id, client_id, client_name, client_email, amount, coefficient, monthly_payment, commission, ambassador_id, status, workflow_status, offer_type, remarks)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            OFFER_COLUMNS
        ))
        .bind(offer_id)
        .bind(company_id)
        .bind(input.client_id)
        .bind(&input.client_name)
        .bind(&input.client_email)
        .bind(input.amount)
        .bind(input.coefficient)
        .bind(input.monthly_payment)
        .bind(input.commission)
        .bind(input.ambassador_id)
        .bind(OfferStatus::Pending.as_str())
        .bind(WorkflowStatus::Draft.as_str())
        .bind(input.offer_type.as_str())
        .bind(&input.remarks)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create offer: {}", e)))?;

        let insert_sql = equipment_insert_sql(ParentType::Offer);
        let mut lines = Vec::with_capacity(input.equipment.len());
        for line in &input.equipment {
            let inserted = sqlx::query_as::<_, EquipmentLine>(&insert_sql)
                .bind(Uuid::new_v4())
                .bind(offer_id)
                .bind(&line.title)
                .bind(line.purchase_price)
                .bind(line.quantity)
                .bind(line.margin_percent)
                .bind(line.monthly_payment_total)
                .bind(&line.serial_number)
                .bind(Json(&line.attributes))
                .bind(Json(&line.specifications))
                .bind(line.delivery_type.as_str())
                .bind(line.delivery_collaborator_id)
                .bind(line.delivery_site_id)
                .bind(&line.delivery_address)
                .bind(&line.delivery_city)
                .bind(&line.delivery_postal_code)
                .bind(&line.delivery_country)
                .bind(&line.delivery_contact_name)
                .bind(&line.delivery_contact_email)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to insert equipment line: {}",
                        e
                    ))
                })?;
            lines.push(inserted);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(
            offer_id = %offer.offer_id,
            equipment_count = lines.len(),
            "Offer created"
        );

        Ok((offer, lines))
    }

    /// Get an offer by ID.
    #[instrument(skip(self), fields(company_id = %company_id, offer_id = %offer_id))]
    pub async fn get_offer(
        &self,
        company_id: Uuid,
        offer_id: Uuid,
    ) -> Result<Option<Offer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_offer"])
            .start_timer();

        let offer = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {} FROM offers WHERE company_id = $1 AND offer_id = $2",
            OFFER_COLUMNS
        ))
        .bind(company_id)
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get offer: {}", e)))?;

        timer.observe_duration();

        Ok(offer)
    }

    /// List offers for a company with optional filters.
    #[instrument(skip(self, filter), fields(company_id = %company_id))]
    pub async fn list_offers(
        &self,
        company_id: Uuid,
        filter: &ListOffersFilter,
    ) -> Result<Vec<Offer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_offers"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;

        let offers = sqlx::query_as::<_, Offer>(&format!(
            r#"
            SELECT {}
            FROM offers
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::text IS NULL OR workflow_status = $4)
              AND ($5::text IS NULL OR offer_type = $5)
              AND ($6::uuid IS NULL OR offer_id > $6)
            ORDER BY offer_id
            LIMIT $7
            "#,
            OFFER_COLUMNS
        ))
        .bind(company_id)
        .bind(filter.client_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.workflow_status.map(|s| s.as_str()))
        .bind(filter.offer_type.map(|t| t.as_str()))
        .bind(filter.page_token)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list offers: {}", e)))?;

        timer.observe_duration();

        Ok(offers)
    }

    /// Update a pre-signature offer.
    #[instrument(skip(self, input), fields(company_id = %company_id, offer_id = %offer_id))]
    pub async fn update_offer(
        &self,
        company_id: Uuid,
        offer_id: Uuid,
        input: &UpdateOffer,
    ) -> Result<Option<Offer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_offer"])
            .start_timer();

        let existing = match self.get_offer(company_id, offer_id).await? {
            Some(offer) => offer,
            None => return Ok(None),
        };
        if existing.is_signed() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Offer {} is signed and can no longer be modified",
                offer_id
            )));
        }

        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            UPDATE offers
            SET client_name = COALESCE($3, client_name),
                client_email = COALESCE($4, client_email),
                amount = COALESCE($5, amount),
                coefficient = COALESCE($6, coefficient),
                monthly_payment = COALESCE($7, monthly_payment),
                commission = COALESCE($8, commission),
                remarks = COALESCE($9, remarks),
                updated_utc = NOW()
            WHERE company_id = $1 AND offer_id = $2 AND signed_at IS NULL
            RETURNING {}
            "#,
            OFFER_COLUMNS
        ))
        .bind(company_id)
        .bind(offer_id)
        .bind(&input.client_name)
        .bind(&input.client_email)
        .bind(input.amount)
        .bind(input.coefficient)
        .bind(input.monthly_payment)
        .bind(input.commission)
        .bind(&input.remarks)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update offer: {}", e)))?;

        timer.observe_duration();

        Ok(offer)
    }

    /// Delete an offer and its equipment lines (cascade).
    #[instrument(skip(self), fields(company_id = %company_id, offer_id = %offer_id))]
    pub async fn delete_offer(&self, company_id: Uuid, offer_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_offer"])
            .start_timer();

        let existing = self.get_offer(company_id, offer_id).await?;
        if let Some(offer) = &existing {
            if offer.is_signed() {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Offer {} is signed and can no longer be deleted",
                    offer_id
                )));
            }
        } else {
            return Ok(false);
        }

        let result = sqlx::query("DELETE FROM offers WHERE company_id = $1 AND offer_id = $2")
            .bind(company_id)
            .bind(offer_id)
            .execute(&self.pool)
            .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Offer {} has a contract and can no longer be deleted",
                    offer_id
                )));
            }
            Err(e) => {
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to delete offer: {}",
                    e
                )));
            }
        };

        timer.observe_duration();
        info!(offer_id = %offer_id, "Offer deleted");

        Ok(result.rows_affected() > 0)
    }

    /// Apply a status and/or workflow-status transition.
    ///
    /// Illegal transitions and transitions on a signed offer are conflicts.
    #[instrument(skip(self), fields(company_id = %company_id, offer_id = %offer_id))]
    pub async fn update_offer_status(
        &self,
        company_id: Uuid,
        offer_id: Uuid,
        status: Option<OfferStatus>,
        workflow_status: Option<WorkflowStatus>,
    ) -> Result<Offer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_offer_status"])
            .start_timer();

        let existing = self
            .get_offer(company_id, offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;
        if existing.is_signed() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Offer {} is signed and can no longer change status",
                offer_id
            )));
        }

        if let Some(next) = status {
            let current = OfferStatus::from_string(&existing.status);
            if !current.can_transition_to(next) {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Illegal status transition: {} -> {}",
                    current.as_str(),
                    next.as_str()
                )));
            }
        }
        if let Some(next) = workflow_status {
            let current = WorkflowStatus::from_string(&existing.workflow_status);
            if !current.can_transition_to(next) {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Illegal workflow transition: {} -> {}",
                    current.as_str(),
                    next.as_str()
                )));
            }
        }

        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            UPDATE offers
            SET status = COALESCE($3, status),
                workflow_status = COALESCE($4, workflow_status),
                updated_utc = NOW()
            WHERE company_id = $1 AND offer_id = $2
            RETURNING {}
            "#,
            OFFER_COLUMNS
        ))
        .bind(company_id)
        .bind(offer_id)
        .bind(status.map(|s| s.as_str()))
        .bind(workflow_status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update offer status: {}", e))
        })?;

        timer.observe_duration();
        info!(
            offer_id = %offer.offer_id,
            status = %offer.status,
            workflow_status = %offer.workflow_status,
            "Offer status updated"
        );

        Ok(offer)
    }

    /// Record the signature and freeze the offer.
    #[instrument(skip(self), fields(company_id = %company_id, offer_id = %offer_id))]
    pub async fn sign_offer(
        &self,
        company_id: Uuid,
        offer_id: Uuid,
        signer_name: &str,
    ) -> Result<Offer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sign_offer"])
            .start_timer();

        let existing = self
            .get_offer(company_id, offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;
        if existing.is_signed() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Offer {} is already signed",
                offer_id
            )));
        }

        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            UPDATE offers
            SET signed_at = NOW(), signer_name = $3, updated_utc = NOW()
            WHERE company_id = $1 AND offer_id = $2 AND signed_at IS NULL
            RETURNING {}
            "#,
            OFFER_COLUMNS
        ))
        .bind(company_id)
        .bind(offer_id)
        .bind(signer_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to sign offer: {}", e)))?;

        timer.observe_duration();
        info!(offer_id = %offer.offer_id, signer = %signer_name, "Offer signed");

        Ok(offer)
    }

    /// Aggregate totals over an offer's equipment lines.
    #[instrument(skip(self), fields(company_id = %company_id, offer_id = %offer_id))]
    pub async fn offer_totals(
        &self,
        company_id: Uuid,
        offer_id: Uuid,
    ) -> Result<EquipmentTotals, AppError> {
        self.get_offer(company_id, offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;

        let lines = self.list_equipment(ParentType::Offer, offer_id).await?;
        Ok(finance::totals(&lines))
    }

    // =========================================================================
    // Equipment Operations
    // =========================================================================

    /// Add an equipment line to an offer or contract.
    #[instrument(skip(self, input), fields(parent_id = %parent_id, parent_type = %parent_type.as_str()))]
    pub async fn add_equipment(
        &self,
        parent_type: ParentType,
        parent_id: Uuid,
        input: &CreateEquipmentLine,
    ) -> Result<EquipmentLine, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["add_equipment"])
            .start_timer();

        let line = sqlx::query_as::<_, EquipmentLine>(&equipment_insert_sql(parent_type))
            .bind(Uuid::new_v4())
            .bind(parent_id)
            .bind(&input.title)
            .bind(input.purchase_price)
            .bind(input.quantity)
            .bind(input.margin_percent)
            .bind(input.monthly_payment_total)
            .bind(&input.serial_number)
            .bind(Json(&input.attributes))
            .bind(Json(&input.specifications))
            .bind(input.delivery_type.as_str())
            .bind(input.delivery_collaborator_id)
            .bind(input.delivery_site_id)
            .bind(&input.delivery_address)
            .bind(&input.delivery_city)
            .bind(&input.delivery_postal_code)
            .bind(&input.delivery_country)
            .bind(&input.delivery_contact_name)
            .bind(&input.delivery_contact_email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to add equipment: {}", e))
            })?;

        timer.observe_duration();
        info!(equipment_id = %line.equipment_id, "Equipment line added");

        Ok(line)
    }

    /// Get one equipment line.
    #[instrument(skip(self), fields(equipment_id = %equipment_id))]
    pub async fn get_equipment(
        &self,
        parent_type: ParentType,
        equipment_id: Uuid,
    ) -> Result<Option<EquipmentLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_equipment"])
            .start_timer();

        let (table, _) = equipment_table(parent_type);
        let line = sqlx::query_as::<_, EquipmentLine>(&format!(
            "SELECT {} FROM {} WHERE equipment_id = $1",
            equipment_columns(parent_type),
            table
        ))
        .bind(equipment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get equipment: {}", e)))?;

        timer.observe_duration();

        Ok(line)
    }

    /// List the equipment lines of an offer or contract.
    #[instrument(skip(self), fields(parent_id = %parent_id, parent_type = %parent_type.as_str()))]
    pub async fn list_equipment(
        &self,
        parent_type: ParentType,
        parent_id: Uuid,
    ) -> Result<Vec<EquipmentLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_equipment"])
            .start_timer();

        let (table, parent_col) = equipment_table(parent_type);
        let lines = sqlx::query_as::<_, EquipmentLine>(&format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY created_utc, equipment_id",
            equipment_columns(parent_type),
            table,
            parent_col
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list equipment: {}", e))
        })?;

        timer.observe_duration();

        Ok(lines)
    }

    /// Update an equipment line's financial and descriptive fields.
    #[instrument(skip(self, input), fields(equipment_id = %equipment_id))]
    pub async fn update_equipment(
        &self,
        parent_type: ParentType,
        equipment_id: Uuid,
        input: &UpdateEquipmentLine,
    ) -> Result<Option<EquipmentLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_equipment"])
            .start_timer();

        let (table, _) = equipment_table(parent_type);
        let line = sqlx::query_as::<_, EquipmentLine>(&format!(
            r#"
            UPDATE {}
            SET title = COALESCE($2, title),
                purchase_price = COALESCE($3, purchase_price),
                quantity = COALESCE($4, quantity),
                margin_percent = COALESCE($5, margin_percent),
                monthly_payment_total = COALESCE($6, monthly_payment_total),
                serial_number = COALESCE($7, serial_number),
                attributes = COALESCE($8, attributes),
                specifications = COALESCE($9, specifications),
                updated_utc = NOW()
            WHERE equipment_id = $1
            RETURNING {}
            "#,
            table,
            equipment_columns(parent_type)
        ))
        .bind(equipment_id)
        .bind(&input.title)
        .bind(input.purchase_price)
        .bind(input.quantity)
        .bind(input.margin_percent)
        .bind(input.monthly_payment_total)
        .bind(&input.serial_number)
        .bind(input.attributes.as_ref().map(Json))
        .bind(input.specifications.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update equipment: {}", e))
        })?;

        timer.observe_duration();

        Ok(line)
    }

    /// Delete an equipment line.
    #[instrument(skip(self), fields(equipment_id = %equipment_id))]
    pub async fn delete_equipment(
        &self,
        parent_type: ParentType,
        equipment_id: Uuid,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_equipment"])
            .start_timer();

        let (table, _) = equipment_table(parent_type);
        let result = sqlx::query(&format!("DELETE FROM {} WHERE equipment_id = $1", table))
            .bind(equipment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete equipment: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Contract Operations
    // =========================================================================

    /// Create a contract from an accepted offer, copying its equipment lines
    /// in the same transaction.
    #[instrument(skip(self, input), fields(company_id = %company_id, offer_id = %input.offer_id))]
    pub async fn create_contract(
        &self,
        company_id: Uuid,
        input: &CreateContract,
    ) -> Result<Contract, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_contract"])
            .start_timer();

        let offer = self
            .get_offer(company_id, input.offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;
        if OfferStatus::from_string(&offer.status) != OfferStatus::Accepted {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Offer {} is not accepted (status: {})",
                offer.offer_id,
                offer.status
            )));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let contract_id = Uuid::new_v4();
        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            INSERT INTO contracts (contract_id, company_id, offer_id, client_id, client_name, monthly_payment, leaser_name, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(contract_id)
        .bind(company_id)
        .bind(offer.offer_id)
        .bind(offer.client_id)
        .bind(&offer.client_name)
        .bind(offer.monthly_payment)
        .bind(&input.leaser_name)
        .bind(ContractStatus::ContractSent.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create contract: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO contract_equipment (equipment_id, contract_id, title, purchase_price, quantity, margin_percent, monthly_payment_total, serial_number, attributes, specifications, delivery_type, delivery_collaborator_id, delivery_site_id, delivery_address, delivery_city, delivery_postal_code, delivery_country, delivery_contact_name, delivery_contact_email, collaborator_id)
            SELECT gen_random_uuid(), $2, title, purchase_price, quantity, margin_percent, monthly_payment_total, serial_number, attributes, specifications, delivery_type, delivery_collaborator_id, delivery_site_id, delivery_address, delivery_city, delivery_postal_code, delivery_country, delivery_contact_name, delivery_contact_email, collaborator_id
            FROM offer_equipment
            WHERE offer_id = $1
            "#,
        )
        .bind(offer.offer_id)
        .bind(contract_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to copy equipment lines: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(
            contract_id = %contract.contract_id,
            offer_id = %offer.offer_id,
            "Contract created from offer"
        );

        Ok(contract)
    }

    /// Get a contract by ID.
    #[instrument(skip(self), fields(company_id = %company_id, contract_id = %contract_id))]
    pub async fn get_contract(
        &self,
        company_id: Uuid,
        contract_id: Uuid,
    ) -> Result<Option<Contract>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_contract"])
            .start_timer();

        let contract = sqlx::query_as::<_, Contract>(&format!(
            "SELECT {} FROM contracts WHERE company_id = $1 AND contract_id = $2",
            CONTRACT_COLUMNS
        ))
        .bind(company_id)
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get contract: {}", e)))?;

        timer.observe_duration();

        Ok(contract)
    }

    /// List contracts for a company.
    #[instrument(skip(self, filter), fields(company_id = %company_id))]
    pub async fn list_contracts(
        &self,
        company_id: Uuid,
        filter: &ListContractsFilter,
    ) -> Result<Vec<Contract>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_contracts"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;

        let contracts = sqlx::query_as::<_, Contract>(&format!(
            r#"
            SELECT {}
            FROM contracts
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::uuid IS NULL OR contract_id > $4)
            ORDER BY contract_id
            LIMIT $5
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(company_id)
        .bind(filter.client_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.page_token)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list contracts: {}", e))
        })?;

        timer.observe_duration();

        Ok(contracts)
    }

    /// Step a contract through its pipeline.
    #[instrument(skip(self), fields(company_id = %company_id, contract_id = %contract_id))]
    pub async fn update_contract_status(
        &self,
        company_id: Uuid,
        contract_id: Uuid,
        next: ContractStatus,
    ) -> Result<Contract, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_contract_status"])
            .start_timer();

        let existing = self
            .get_contract(company_id, contract_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contract not found")))?;

        let current = ContractStatus::from_string(&existing.status);
        if !current.can_transition_to(next) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Illegal contract transition: {} -> {}",
                current.as_str(),
                next.as_str()
            )));
        }

        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET status = $3, updated_utc = NOW()
            WHERE company_id = $1 AND contract_id = $2
            RETURNING {}
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(company_id)
        .bind(contract_id)
        .bind(next.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update contract status: {}", e))
        })?;

        timer.observe_duration();
        info!(
            contract_id = %contract.contract_id,
            status = %contract.status,
            "Contract status updated"
        );

        Ok(contract)
    }

    // =========================================================================
    // Assignment Registry
    // =========================================================================

    /// Equipment lines assignable for a client. Only contract equipment
    /// qualifies; offer lines are never assignable.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn client_equipment(&self, client_id: Uuid) -> Result<Vec<EquipmentLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["client_equipment"])
            .start_timer();

        let lines = sqlx::query_as::<_, EquipmentLine>(
            r#"
            SELECT e.equipment_id, e.contract_id AS parent_id, 'contract'::text AS parent_type, e.title, e.purchase_price, e.quantity, e.margin_percent, e.monthly_payment_total, e.serial_number, e.attributes, e.specifications, e.delivery_type, e.delivery_collaborator_id, e.delivery_site_id, e.delivery_address, e.delivery_city, e.delivery_postal_code, e.delivery_country, e.delivery_contact_name, e.delivery_contact_email, e.collaborator_id, e.created_utc, e.updated_utc
            FROM contract_equipment e
            JOIN contracts c ON c.contract_id = e.contract_id
            WHERE c.client_id = $1
            ORDER BY e.created_utc, e.equipment_id
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get client equipment: {}", e))
        })?;

        timer.observe_duration();

        Ok(lines)
    }

    /// Client equipment grouped per collaborator, with the synthetic
    /// unassigned group always present.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn equipment_by_collaborator(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<CollaboratorGroup>, AppError> {
        let collaborators = self.list_collaborators(client_id).await?;
        let equipment = self.client_equipment(client_id).await?;
        Ok(group_equipment(&collaborators, equipment))
    }

    /// Point an equipment line at a collaborator (or unassign with `None`),
    /// writing the audit row in the same transaction.
    #[instrument(skip(self), fields(equipment_id = %equipment_id, parent_type = %parent_type.as_str()))]
    pub async fn assign_equipment(
        &self,
        parent_type: ParentType,
        equipment_id: Uuid,
        collaborator_id: Option<Uuid>,
        assigned_by: Option<&str>,
    ) -> Result<EquipmentLine, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["assign_equipment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let (table, _) = equipment_table(parent_type);
        let line = sqlx::query_as::<_, EquipmentLine>(&format!(
            r#"
            UPDATE {}
            SET collaborator_id = $2, updated_utc = NOW()
            WHERE equipment_id = $1
            RETURNING {}
            "#,
            table,
            equipment_columns(parent_type)
        ))
        .bind(equipment_id)
        .bind(collaborator_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to assign equipment: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Equipment line not found")))?;

        sqlx::query(
            r#"
            INSERT INTO equipment_assignments_history (history_id, equipment_id, parent_type, collaborator_id, assigned_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(equipment_id)
        .bind(parent_type.as_str())
        .bind(collaborator_id)
        .bind(assigned_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to record assignment: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(
            equipment_id = %equipment_id,
            collaborator_id = ?collaborator_id,
            "Equipment assignment updated"
        );

        Ok(line)
    }

    /// Assignment audit trail for one equipment line, newest first. The
    /// collaborator name is joined at read time; deleted collaborators come
    /// back with no name and callers substitute a placeholder.
    #[instrument(skip(self), fields(equipment_id = %equipment_id, parent_type = %parent_type.as_str()))]
    pub async fn assignment_history(
        &self,
        parent_type: ParentType,
        equipment_id: Uuid,
    ) -> Result<Vec<AssignmentRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["assignment_history"])
            .start_timer();

        let records = sqlx::query_as::<_, AssignmentRecord>(
            r#"
            SELECT h.history_id, h.equipment_id, h.parent_type, h.collaborator_id, c.name AS collaborator_name, h.assigned_by, h.created_utc
            FROM equipment_assignments_history h
            LEFT JOIN collaborators c ON c.collaborator_id = h.collaborator_id
            WHERE h.equipment_id = $1 AND h.parent_type = $2
            ORDER BY h.created_utc DESC, h.history_id DESC
            "#,
        )
        .bind(equipment_id)
        .bind(parent_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get assignment history: {}", e))
        })?;

        timer.observe_duration();

        Ok(records)
    }
}
