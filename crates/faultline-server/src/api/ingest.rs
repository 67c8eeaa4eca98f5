//! Ingestion endpoints.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use faultline_core::{
    codes, ErrorKind, ErrorOrigin, ErrorReport, NewErrorRecord, Severity,
};

use super::{error_response, AppState, ErrorResponse};

/// Response for a single ingested record.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// The assigned record ID.
    pub id: String,
}

/// Response for a batch of ingested records.
#[derive(Debug, Serialize)]
pub struct BatchIngestResponse {
    /// Assigned record IDs, in input order.
    pub ids: Vec<String>,
    /// How many records were logged.
    pub logged: usize,
}

/// Request to log one error with caller-supplied classification.
#[derive(Debug, Deserialize)]
pub struct LogErrorRequest {
    /// Origin classification.
    pub error_type: ErrorKind,
    /// Urgency classification.
    pub severity: Severity,
    /// Producing tier.
    pub source: ErrorOrigin,
    /// Human-readable message.
    pub error_message: String,
    /// Stable code; defaults to the origin classification's wire value.
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub http_status: Option<i32>,
    #[serde(default)]
    pub context_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The collection endpoint: accept one UI report from a capture client.
///
/// The server owns classification here — every report is stored as a
/// frontend UI error of medium severity, with the reported location as its
/// endpoint. Transport-level user agent and peer address win over what the
/// payload claims.
pub async fn ui_error(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(report): Json<ErrorReport>,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, Json<ErrorResponse>)> {
    let error_code = report
        .error_code
        .unwrap_or_else(|| codes::UI_ERROR.to_owned());

    let mut record = NewErrorRecord::new(
        ErrorKind::UiError,
        Severity::Medium,
        ErrorOrigin::Frontend,
        error_code,
        report.error_message,
    )
    .with_endpoint(report.page_url)
    .with_session(report.session_id)
    .with_context(report.metadata);

    record.stack_trace = report.stack_trace;
    record.user_id = report.user_id;
    record.user_agent = header_string(&headers, USER_AGENT.as_str()).or_else(|| {
        if report.user_agent.is_empty() {
            None
        } else {
            Some(report.user_agent)
        }
    });
    record.ip_address = peer_address(&headers);
    record.request_id = header_string(&headers, "x-request-id");

    match state.store.insert(record).await {
        Ok(stored) => {
            info!(
                error_audit_id = %stored.id,
                session_id = ?stored.session_id,
                "UI error recorded"
            );
            Ok((
                StatusCode::ACCEPTED,
                Json(IngestResponse {
                    id: stored.id.to_string(),
                }),
            ))
        }
        Err(e) => Err(error_response(&e)),
    }
}

/// Log a single error with caller-supplied classification.
pub async fn log_error(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LogErrorRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, Json<ErrorResponse>)> {
    let record = record_from(request, &headers);

    match state.store.insert(record).await {
        Ok(stored) => {
            info!(error_audit_id = %stored.id, error_type = %stored.error_type, "error recorded");
            Ok((
                StatusCode::CREATED,
                Json(IngestResponse {
                    id: stored.id.to_string(),
                }),
            ))
        }
        Err(e) => Err(error_response(&e)),
    }
}

/// Log multiple errors in one request.
///
/// The batch is validated as a whole before anything is written; IDs come
/// back in input order.
pub async fn log_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(requests): Json<Vec<LogErrorRequest>>,
) -> Result<(StatusCode, Json<BatchIngestResponse>), (StatusCode, Json<ErrorResponse>)> {
    let records: Vec<NewErrorRecord> = requests
        .into_iter()
        .map(|request| record_from(request, &headers))
        .collect();

    match state.store.insert_batch(records).await {
        Ok(ids) => {
            info!(logged = ids.len(), "error batch recorded");
            let logged = ids.len();
            Ok((
                StatusCode::CREATED,
                Json(BatchIngestResponse {
                    ids: ids.into_iter().map(|id| id.to_string()).collect(),
                    logged,
                }),
            ))
        }
        Err(e) => Err(error_response(&e)),
    }
}

fn record_from(request: LogErrorRequest, headers: &HeaderMap) -> NewErrorRecord {
    let error_code = request
        .error_code
        .unwrap_or_else(|| request.error_type.as_str().to_owned());

    let mut record = NewErrorRecord::new(
        request.error_type,
        request.severity,
        request.source,
        error_code,
        request.error_message,
    );

    record.stack_trace = request.stack_trace;
    record.endpoint = request.endpoint;
    record.http_method = request.http_method;
    record.http_status = request.http_status;
    record.context_data = request.context_data.unwrap_or_default();
    record.user_id = request.user_id;
    record.session_id = request.session_id;
    record.user_agent = header_string(headers, USER_AGENT.as_str());
    record.ip_address = peer_address(headers);
    record.request_id = header_string(headers, "x-request-id");
    if let Some(environment) = request.environment {
        record.environment = environment;
    }

    record
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Best-effort peer address from proxy headers.
fn peer_address(headers: &HeaderMap) -> Option<String> {
    header_string(headers, "x-forwarded-for")
        .and_then(|forwarded| {
            forwarded
                .split(',')
                .next()
                .map(|addr| addr.trim().to_owned())
        })
        .or_else(|| header_string(headers, "x-real-ip"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_address_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.7, 10.0.0.1".parse().unwrap(),
        );
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());

        assert_eq!(peer_address(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn peer_address_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());

        assert_eq!(peer_address(&headers).as_deref(), Some("10.0.0.2"));
        assert_eq!(peer_address(&HeaderMap::new()), None);
    }
}
