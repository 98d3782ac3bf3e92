//! HTTP front end for CapBank.
//!
//! Routes:
//! - `GET  /packages`, `/api/packages` - package identifiers, smallest first
//! - `POST /optimize`, `/api/optimize` - ranked networks for one request
//! - `GET  /health`
//!
//! Optimizations are CPU-bound and run on the blocking pool so the async
//! workers stay free for other connections.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use capbank::catalog::load_catalog;
use capbank::{CapBankError, Candidate, CatalogStore, OptimizationService, OptimizeRequest, ServiceOptions};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    service: Arc<OptimizationService>,
}

impl AppState {
    pub fn new(service: OptimizationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> &Arc<OptimizationService> {
        &self.service
    }
}

/// Settings for [`run`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Catalog file or directory; the built-in catalog when `None`
    pub catalog: Option<PathBuf>,
    pub options: ServiceOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            catalog: None,
            options: ServiceOptions::default(),
        }
    }
}

/// Build the router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/packages", get(packages_handler))
        .route("/api/packages", get(packages_handler))
        .route("/optimize", post(optimize_handler))
        .route("/api/optimize", post(optimize_handler))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}

/// Load the catalog, bind, and serve until Ctrl+C.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let parts = load_catalog(config.catalog.as_deref()).context("failed to load catalog")?;
    let catalog = Arc::new(CatalogStore::new(parts)?);
    let service = OptimizationService::new(catalog, config.options)?;
    let router = app(AppState::new(service));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind to {}:{}", config.host, config.port))?;
    tracing::info!("CapBank listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}

// HTTP Handlers

async fn packages_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.packages().to_vec())
}

async fn optimize_handler(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let service = Arc::clone(&state.service);
    let result = tokio::task::spawn_blocking(move || service.optimize(&request))
        .await
        .map_err(|e| CapBankError::Internal(format!("optimization task failed: {}", e)))??;
    Ok(Json(result.candidates))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
}

async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: "capbank",
    })
}

/// Library error mapped onto an HTTP status.
#[derive(Debug)]
pub struct ApiError(pub CapBankError);

impl From<CapBankError> for ApiError {
    fn from(e: CapBankError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CapBankError::InvalidConstraint(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            CapBankError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, self.0.to_string()),
            other => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capbank::ConstraintError;
    use std::time::Duration;

    #[test]
    fn test_error_status_mapping() {
        let status = |e: CapBankError| ApiError(e).into_response().status();
        assert_eq!(
            status(ConstraintError::NoUsablePackages.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(CapBankError::Timeout {
                elapsed: Duration::from_secs(5),
                evaluated: 10
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status(CapBankError::Internal("bad part".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
