//! HTTP boundary for batch remediation.
//!
//! - `POST /remediate-array` takes a JSON array of code units and returns
//!   one result per unit, in order. A batch with any invalid record is
//!   rejected as a whole by the JSON extractor.
//! - `GET /health` reports the version and configured output mode.
//!
//! Request bodies are unbounded unless `max_body_bytes` is configured.

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::RemediatorConfig;
use crate::error::{DraftfixError, DraftfixResult};
use crate::model::{CodeUnit, UnitResult};
use crate::processor::Remediator;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub mode: String,
}

/// Create the router with all endpoints.
pub fn create_router(remediator: Arc<Remediator>) -> Router {
    let body_limit = match remediator.config().max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/remediate-array", post(remediate_array))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(remediator)
}

pub async fn health_check(State(remediator): State<Arc<Remediator>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: remediator.mode().to_string(),
    })
}

pub async fn remediate_array(
    State(remediator): State<Arc<Remediator>>,
    Json(units): Json<Vec<CodeUnit>>,
) -> Json<Vec<UnitResult>> {
    tracing::debug!("Received batch of {} unit(s)", units.len());
    Json(remediator.process_batch(&units))
}

/// The remediation HTTP server.
pub struct Server {
    config: RemediatorConfig,
}

impl Server {
    pub fn new(config: RemediatorConfig) -> Self {
        Self { config }
    }

    /// Router bound to a remediator built from this server's config.
    pub fn router(&self) -> Router {
        create_router(Arc::new(Remediator::new(self.config.clone())))
    }

    /// Bind and serve until the process is stopped.
    pub async fn serve(self) -> DraftfixResult<()> {
        let router = self.router();
        let addr = &self.config.bind_address;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DraftfixError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        tracing::info!("draftfix listening on {} ({} mode)", addr, self.config.mode);
        tracing::info!("   POST /remediate-array - Remediate a batch of code units");
        tracing::info!("   GET  /health          - Health check");

        axum::serve(listener, router)
            .await
            .map_err(|e| DraftfixError::Server(e.to_string()))?;

        Ok(())
    }
}
