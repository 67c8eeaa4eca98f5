//! Request-audit middleware.
//!
//! Stamps a request identifier on every inbound request and audits 5xx
//! responses fire-and-forget. The response path is never delayed or altered
//! by auditing.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{Map, Value};

use faultline_core::generate_request_id;

use crate::auditor::ApiErrorEvent;

use super::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stamp a request identifier and audit server failures.
pub async fn audit_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = generate_request_id();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let query = request.uri().query().map(ToOwned::to_owned);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if response.status().is_server_error() {
        let status = i32::from(response.status().as_u16());

        let mut context = Map::new();
        context.insert("path".to_owned(), Value::String(path.clone()));
        if let Some(query) = query {
            context.insert("query".to_owned(), Value::String(query));
        }

        let mut event = ApiErrorEvent::new("Internal server error", path, method, status)
            .with_code("UNHANDLED_ERROR")
            .with_request(request_id)
            .with_context(context);
        if let Some(user_agent) = user_agent {
            event = event.with_user_agent(user_agent);
        }

        // Recording happens off the response path; a slow or failing store
        // cannot delay the caller.
        let auditor = Arc::clone(&state.auditor);
        tokio::spawn(async move {
            auditor.record_api_error(event).await;
        });
    }

    response
}
