//! HTTP API for the collection service.
//!
//! Provides endpoints for:
//! - The collection endpoint clients post UI reports to
//! - Generic and batch error ingestion
//! - Querying and resolving audit records
//! - Health and readiness checks
//! - Prometheus metrics

mod errors;
mod ingest;
pub mod middleware;

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

use faultline_core::Severity;

use crate::auditor::Auditor;
use crate::error::AuditError;
use crate::store::{AuditStore, ErrorFilter};

pub use errors::{ErrorListResponse, ListErrorsQuery, ResolveRequest};
pub use ingest::{BatchIngestResponse, IngestResponse, LogErrorRequest};

/// Shared application state for the collection service.
#[derive(Clone)]
pub struct AppState {
    /// Audit store for ingestion and queries.
    pub store: Arc<dyn AuditStore>,
    /// Server-side capture for failures of this service itself.
    pub auditor: Arc<Auditor>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Ingestion
        .route("/error-audit/ui-error", post(ingest::ui_error))
        .route("/errors/log", post(ingest::log_error))
        .route("/errors/log-batch", post(ingest::log_batch))
        // Query and resolution
        .route("/errors", get(errors::list_errors))
        .route("/errors/{id}", get(errors::get_error))
        .route("/errors/{id}/resolve", post(errors::resolve_error))
        // Metrics
        .route("/metrics", get(metrics))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::audit_request,
        ))
        .with_state(state)
}

/// Map a store error onto the status its caller should see.
const fn error_to_status(error: &AuditError) -> axum::http::StatusCode {
    match error {
        AuditError::RecordNotFound(_) => axum::http::StatusCode::NOT_FOUND,
        AuditError::Validation(_) => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
        _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &AuditError) -> (axum::http::StatusCode, axum::Json<ErrorResponse>) {
    (
        error_to_status(error),
        axum::Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Health check endpoint.
async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse { status: "healthy" })
}

/// Readiness check endpoint. Round-trips the store.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> (axum::http::StatusCode, axum::Json<ReadyResponse>) {
    match state.store.list(&ErrorFilter::new().with_limit(1)).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::Json(ReadyResponse { ready: true }),
        ),
        Err(_) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(ReadyResponse { ready: false }),
        ),
    }
}

/// Metrics endpoint.
async fn metrics(axum::extract::State(state): axum::extract::State<AppState>) -> String {
    let mut output = String::new();

    output.push_str("# HELP faultline_unresolved_errors Unresolved error records by severity\n");
    output.push_str("# TYPE faultline_unresolved_errors gauge\n");

    for severity in Severity::all() {
        let filter = ErrorFilter::new()
            .with_resolved(false)
            .with_severity(severity);
        let count = state
            .store
            .list(&filter)
            .await
            .map(|records| records.len())
            .unwrap_or(0);
        let _ = writeln!(
            output,
            "faultline_unresolved_errors{{severity=\"{}\"}} {count}",
            severity.as_str().to_lowercase()
        );
    }

    output
}

/// Health response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Readiness response.
#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
}
