//! Query and resolution endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use faultline_core::{AuditId, ErrorKind, ErrorRecord, Severity};

use crate::store::ErrorFilter;

use super::{error_response, AppState, ErrorResponse};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for listing error records.
#[derive(Debug, Default, Deserialize)]
pub struct ListErrorsQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub limit: Option<u32>,
    /// Filter by origin classification.
    pub error_type: Option<String>,
    /// Filter by urgency classification.
    pub severity: Option<String>,
    /// Filter by acting user.
    pub user_id: Option<String>,
    /// Filter by failing endpoint.
    pub endpoint: Option<String>,
    /// Filter by resolution state.
    pub resolved: Option<bool>,
    /// Only records created at or after this RFC 3339 instant.
    pub start_time: Option<String>,
    /// Only records created before this RFC 3339 instant.
    pub end_time: Option<String>,
}

/// Response for a record listing.
#[derive(Debug, Serialize)]
pub struct ErrorListResponse {
    /// Matching records, newest first.
    pub errors: Vec<ErrorRecord>,
    /// Page number served.
    pub page: u32,
    /// Page size served.
    pub limit: u32,
}

/// Request to resolve a record.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    /// Who resolved the record. Opaque identity reference.
    pub resolved_by: String,
}

/// List error records with optional filters, newest first.
pub async fn list_errors(
    State(state): State<AppState>,
    Query(query): Query<ListErrorsQuery>,
) -> Result<Json<ErrorListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut filter = ErrorFilter::new()
        .with_limit(limit)
        .with_offset((page - 1) * limit);

    if let Some(ref raw) = query.error_type {
        let error_type = raw.parse::<ErrorKind>().map_err(bad_request)?;
        filter = filter.with_error_type(error_type);
    }
    if let Some(ref raw) = query.severity {
        let severity = raw.parse::<Severity>().map_err(bad_request)?;
        filter = filter.with_severity(severity);
    }
    if let Some(user_id) = query.user_id {
        filter = filter.with_user(user_id);
    }
    if let Some(endpoint) = query.endpoint {
        filter = filter.with_endpoint(endpoint);
    }
    if let Some(resolved) = query.resolved {
        filter = filter.with_resolved(resolved);
    }
    if let Some(ref raw) = query.start_time {
        filter = filter.with_start_time(parse_instant(raw)?);
    }
    if let Some(ref raw) = query.end_time {
        filter = filter.with_end_time(parse_instant(raw)?);
    }

    match state.store.list(&filter).await {
        Ok(errors) => Ok(Json(ErrorListResponse {
            errors,
            page,
            limit,
        })),
        Err(e) => Err(error_response(&e)),
    }
}

/// Get one record by ID.
pub async fn get_error(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ErrorRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(&AuditId::new(&id)).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("error record not found: {id}"),
            }),
        )),
        Err(e) => Err(error_response(&e)),
    }
}

/// Resolve a record.
///
/// Resolving an already-resolved record succeeds and returns the original
/// stamps, so automated sweepers can retry safely.
pub async fn resolve_error(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ErrorRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .store
        .resolve(&AuditId::new(&id), &request.resolved_by)
        .await
    {
        Ok(record) => {
            info!(
                error_audit_id = %record.id,
                resolved_by = %request.resolved_by,
                "error record resolved"
            );
            Ok(Json(record))
        }
        Err(e) => Err(error_response(&e)),
    }
}

fn bad_request(error: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, (StatusCode, Json<ErrorResponse>)> {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| bad_request(format!("invalid timestamp '{raw}': {e}")))
}
