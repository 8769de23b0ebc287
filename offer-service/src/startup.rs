//! Application startup and lifecycle management.

use crate::config::OfferConfig;
use crate::handlers;
use crate::services::{get_metrics, init_metrics, Database};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: OfferConfig,
    pub db: Arc<Database>,
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": "offer-service",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "offer-service",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => {
            tracing::debug!("Readiness check passed");
            StatusCode::OK
        }
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics endpoint for Prometheus scraping.
async fn metrics_handler() -> impl IntoResponse {
    let metrics = get_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        metrics,
    )
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        // Offer endpoints
        .route(
            "/offers",
            post(handlers::offers::create_offer).get(handlers::offers::list_offers),
        )
        .route("/offers/wizard", post(handlers::wizard::submit_wizard))
        .route(
            "/offers/:offer_id",
            get(handlers::offers::get_offer)
                .patch(handlers::offers::update_offer)
                .delete(handlers::offers::delete_offer),
        )
        .route(
            "/offers/:offer_id/status",
            post(handlers::offers::update_offer_status),
        )
        .route("/offers/:offer_id/sign", post(handlers::offers::sign_offer))
        .route(
            "/offers/:offer_id/totals",
            get(handlers::offers::offer_totals),
        )
        .route(
            "/offers/:offer_id/equipment",
            post(handlers::equipment::add_offer_equipment)
                .get(handlers::equipment::list_offer_equipment),
        )
        .route(
            "/offers/:offer_id/equipment/:equipment_id",
            axum::routing::patch(handlers::equipment::update_offer_equipment)
                .delete(handlers::equipment::delete_offer_equipment),
        )
        // Contract endpoints
        .route(
            "/contracts",
            post(handlers::contracts::create_contract).get(handlers::contracts::list_contracts),
        )
        .route("/contracts/:contract_id", get(handlers::contracts::get_contract))
        .route(
            "/contracts/:contract_id/status",
            post(handlers::contracts::update_contract_status),
        )
        .route(
            "/contracts/:contract_id/equipment",
            get(handlers::equipment::list_contract_equipment),
        )
        // Client endpoints
        .route(
            "/clients",
            post(handlers::clients::create_client).get(handlers::clients::list_clients),
        )
        .route(
            "/clients/:client_id",
            get(handlers::clients::get_client)
                .patch(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route(
            "/clients/:client_id/collaborators",
            post(handlers::collaborators::create_collaborator)
                .get(handlers::collaborators::list_collaborators),
        )
        .route(
            "/clients/:client_id/collaborators/:collaborator_id",
            axum::routing::patch(handlers::collaborators::update_collaborator)
                .delete(handlers::collaborators::delete_collaborator),
        )
        // Assignment registry
        .route(
            "/clients/:client_id/equipment",
            get(handlers::assignments::client_equipment),
        )
        .route(
            "/clients/:client_id/equipment/by-collaborator",
            get(handlers::assignments::equipment_by_collaborator),
        )
        .route(
            "/equipment/:parent_type/:equipment_id/assignment",
            post(handlers::assignments::assign_equipment),
        )
        .route(
            "/equipment/:parent_type/:equipment_id/assignments",
            get(handlers::assignments::assignment_history),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: OfferConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: OfferConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: OfferConfig, run_migrations: bool) -> Result<Self, AppError> {
        // Initialize metrics
        init_metrics();

        // Connect to database
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        // Run migrations only if requested
        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let db = Arc::new(db);

        let state = AppState {
            config: config.clone(),
            db,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Offer service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = router(self.state.clone());

        tracing::info!(
            service = "offer-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await
    }
}
