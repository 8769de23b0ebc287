//! Database service for catalog-service.
//!
//! All queries are reads. Catalog content, companies and API keys are
//! written by their owning services; this service only serves them.

use crate::models::{
    Brand, CatalogSettings, Category, CategoryImpact, CompanyCustomizations, CompanyProfile,
    EnvironmentalReport, Pack, PackItem, Product, ProductCo2, VariantPrice, CO2_SOURCE,
};
use crate::services::metrics::DB_QUERY_DURATION;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "p.product_id, p.company_id, p.name, p.description, p.brand_id, b.label AS brand_name, p.category_id, c.label AS category_name, p.price, p.monthly_price, p.image_url, p.is_active, p.attributes, p.specifications, p.created_utc, p.updated_utc";

const PRODUCT_FROM: &str = "FROM products p LEFT JOIN brands b ON b.brand_id = p.brand_id LEFT JOIN categories c ON c.category_id = p.category_id";

const VARIANT_COLUMNS: &str =
    "v.variant_price_id, v.product_id, v.attributes, v.price, v.monthly_price, v.created_utc, v.updated_utc";

const PACK_COLUMNS: &str =
    "pack_id, company_id, name, description, image_url, monthly_price, is_active, created_utc, updated_utc";

/// Key row loaded during authentication.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyAuth {
    pub key_id: Uuid,
    pub company_id: Uuid,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "catalog-service"))]
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
    // API Key Lookup
    // =========================================================================

    /// Find a key by its SHA-256 digest.
    #[instrument(skip(self, key_digest))]
    pub async fn find_api_key(&self, key_digest: &str) -> Result<Option<ApiKeyAuth>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_api_key"])
            .start_timer();

        let key = sqlx::query_as::<_, ApiKeyAuth>(
            "SELECT key_id, company_id FROM api_keys WHERE key_digest = $1",
        )
        .bind(key_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to look up API key: {}", e)))?;

        timer.observe_duration();

        Ok(key)
    }

    /// Stamp a key's last use.
    pub async fn touch_api_key(&self, key_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE api_keys SET last_used_utc = NOW() WHERE key_id = $1")
            .bind(key_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to touch API key: {}", e)))?;

        Ok(())
    }

    // =========================================================================
    // Company
    // =========================================================================

    /// Public profile of the company behind a catalog.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn get_company_profile(
        &self,
        company_id: Uuid,
    ) -> Result<Option<CompanyProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_company_profile"])
            .start_timer();

        let profile = sqlx::query_as::<_, CompanyProfile>(
            "SELECT company_id, name, slug, logo_url, primary_color, secondary_color, accent_color
             FROM companies WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get company profile: {}", e))
        })?;

        timer.observe_duration();

        Ok(profile)
    }

    /// Presentation settings, when the company has customized them.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn get_catalog_settings(
        &self,
        company_id: Uuid,
    ) -> Result<Option<CatalogSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_catalog_settings"])
            .start_timer();

        let settings = sqlx::query_as::<_, CatalogSettings>(
            "SELECT company_id, header_enabled, header_title, header_description, show_prices, show_co2_savings, items_per_page, updated_utc
             FROM catalog_settings WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get catalog settings: {}", e))
        })?;

        timer.observe_duration();

        Ok(settings)
    }

    /// Catalog identity overrides, when present.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn get_customizations(
        &self,
        company_id: Uuid,
    ) -> Result<Option<CompanyCustomizations>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customizations"])
            .start_timer();

        let customizations = sqlx::query_as::<_, CompanyCustomizations>(
            "SELECT company_id, catalog_name, logo_url, primary_color, secondary_color, accent_color, welcome_text, updated_utc
             FROM company_customizations WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get customizations: {}", e))
        })?;

        timer.observe_duration();

        Ok(customizations)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List active products with brand and category labels resolved.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list_products(
        &self,
        company_id: Uuid,
        page_size: i32,
        page_token: Option<Uuid>,
    ) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let limit = page_size.clamp(1, 100) as i64;

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            {}
            WHERE p.company_id = $1
              AND p.is_active
              AND ($2::uuid IS NULL OR p.product_id > $2)
            ORDER BY p.product_id
            LIMIT $3
            "#,
            PRODUCT_COLUMNS, PRODUCT_FROM
        ))
        .bind(company_id)
        .bind(page_token)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Get one product.
    #[instrument(skip(self), fields(company_id = %company_id, product_id = %product_id))]
    pub async fn get_product(
        &self,
        company_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} {} WHERE p.company_id = $1 AND p.product_id = $2",
            PRODUCT_COLUMNS, PRODUCT_FROM
        ))
        .bind(company_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// Variant price combinations of a product.
    #[instrument(skip(self), fields(company_id = %company_id, product_id = %product_id))]
    pub async fn list_variant_prices(
        &self,
        company_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<VariantPrice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_variant_prices"])
            .start_timer();

        let variants = sqlx::query_as::<_, VariantPrice>(&format!(
            r#"
            SELECT {}
            FROM product_variant_prices v
            JOIN products p ON p.product_id = v.product_id
            WHERE p.company_id = $1 AND v.product_id = $2
            ORDER BY v.created_utc
            "#,
            VARIANT_COLUMNS
        ))
        .bind(company_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list variant prices: {}", e))
        })?;

        timer.observe_duration();

        Ok(variants)
    }

    /// Active products sharing the category of the given product, newest
    /// first. Uncategorized products have no related set.
    #[instrument(skip(self), fields(company_id = %company_id, product_id = %product_id))]
    pub async fn related_products(
        &self,
        company_id: Uuid,
        product_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["related_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            {}
            WHERE p.company_id = $1
              AND p.is_active
              AND p.product_id <> $2
              AND p.category_id = (
                  SELECT category_id FROM products
                  WHERE company_id = $1 AND product_id = $2
              )
            ORDER BY p.created_utc DESC
            LIMIT $3
            "#,
            PRODUCT_COLUMNS, PRODUCT_FROM
        ))
        .bind(company_id)
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list related products: {}", e))
        })?;

        timer.observe_duration();

        Ok(products)
    }

    /// Per-category CO2 saving attributed to a product.
    #[instrument(skip(self), fields(company_id = %company_id, product_id = %product_id))]
    pub async fn product_co2(
        &self,
        company_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<ProductCo2>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["product_co2"])
            .start_timer();

        let row = sqlx::query_as::<_, (Option<String>, Option<Decimal>)>(
            r#"
            SELECT c.label, c.co2_savings_kg
            FROM products p
            LEFT JOIN categories c ON c.category_id = p.category_id
            WHERE p.company_id = $1 AND p.product_id = $2
            "#,
        )
        .bind(company_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product CO2: {}", e)))?;

        timer.observe_duration();

        Ok(row.map(|(category_name, co2)| ProductCo2 {
            product_id,
            category_name,
            co2_savings_kg: co2.unwrap_or(Decimal::ZERO),
            source: CO2_SOURCE.to_string(),
        }))
    }

    /// Case-insensitive name/description search over active products.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn search_products(
        &self,
        company_id: Uuid,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_products"])
            .start_timer();

        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {}
            {}
            WHERE p.company_id = $1
              AND p.is_active
              AND (p.name ILIKE $2 OR p.description ILIKE $2)
            ORDER BY p.name
            LIMIT $3
            "#,
            PRODUCT_COLUMNS, PRODUCT_FROM
        ))
        .bind(company_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to search products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    // =========================================================================
    // Taxonomy
    // =========================================================================

    /// Categories of a company's catalog.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list_categories(&self, company_id: Uuid) -> Result<Vec<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_categories"])
            .start_timer();

        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, company_id, name, label, co2_savings_kg, created_utc, updated_utc
             FROM categories WHERE company_id = $1 ORDER BY label",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list categories: {}", e))
        })?;

        timer.observe_duration();

        Ok(categories)
    }

    /// Brands of a company's catalog.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list_brands(&self, company_id: Uuid) -> Result<Vec<Brand>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_brands"])
            .start_timer();

        let brands = sqlx::query_as::<_, Brand>(
            "SELECT brand_id, company_id, name, label, created_utc, updated_utc
             FROM brands WHERE company_id = $1 ORDER BY label",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list brands: {}", e)))?;

        timer.observe_duration();

        Ok(brands)
    }

    // =========================================================================
    // Packs
    // =========================================================================

    /// Active packs.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn list_packs(&self, company_id: Uuid) -> Result<Vec<Pack>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_packs"])
            .start_timer();

        let packs = sqlx::query_as::<_, Pack>(&format!(
            "SELECT {} FROM packs WHERE company_id = $1 AND is_active ORDER BY name",
            PACK_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list packs: {}", e)))?;

        timer.observe_duration();

        Ok(packs)
    }

    /// Get one pack.
    #[instrument(skip(self), fields(company_id = %company_id, pack_id = %pack_id))]
    pub async fn get_pack(&self, company_id: Uuid, pack_id: Uuid) -> Result<Option<Pack>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_pack"])
            .start_timer();

        let pack = sqlx::query_as::<_, Pack>(&format!(
            "SELECT {} FROM packs WHERE company_id = $1 AND pack_id = $2",
            PACK_COLUMNS
        ))
        .bind(company_id)
        .bind(pack_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get pack: {}", e)))?;

        timer.observe_duration();

        Ok(pack)
    }

    /// Items of a pack with product names resolved.
    #[instrument(skip(self), fields(pack_id = %pack_id))]
    pub async fn list_pack_items(&self, pack_id: Uuid) -> Result<Vec<PackItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_pack_items"])
            .start_timer();

        let items = sqlx::query_as::<_, PackItem>(
            r#"
            SELECT i.pack_item_id, i.pack_id, i.product_id, p.name AS product_name, p.image_url AS product_image_url, i.quantity
            FROM pack_items i
            JOIN products p ON p.product_id = i.product_id
            WHERE i.pack_id = $1
            ORDER BY i.created_utc
            "#,
        )
        .bind(pack_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list pack items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    // =========================================================================
    // Environmental
    // =========================================================================

    /// Company-level CO2 aggregate across active products. Uncategorized
    /// products count toward the product total but contribute no CO2.
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub async fn environmental_report(
        &self,
        company_id: Uuid,
    ) -> Result<EnvironmentalReport, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["environmental_report"])
            .start_timer();

        let total_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE company_id = $1 AND is_active",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count products: {}", e)))?;

        let categories = sqlx::query_as::<_, CategoryImpact>(
            r#"
            SELECT c.name,
                   c.label,
                   COUNT(p.product_id) AS product_count,
                   c.co2_savings_kg AS co2_savings_kg_per_unit,
                   COUNT(p.product_id) * c.co2_savings_kg AS total_co2_savings_kg
            FROM categories c
            JOIN products p ON p.category_id = c.category_id AND p.is_active
            WHERE c.company_id = $1
            GROUP BY c.category_id, c.name, c.label, c.co2_savings_kg
            ORDER BY c.label
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to build environmental report: {}", e))
        })?;

        timer.observe_duration();

        let total_co2_savings_kg = categories
            .iter()
            .map(|c| c.total_co2_savings_kg)
            .sum::<Decimal>();

        Ok(EnvironmentalReport {
            company_id,
            total_products,
            total_co2_savings_kg,
            source: CO2_SOURCE.to_string(),
            categories,
        })
    }
}
