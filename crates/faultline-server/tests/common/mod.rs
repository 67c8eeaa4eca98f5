//! Common test utilities for collection service integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use faultline_server::api::{router, AppState};
use faultline_server::auditor::Auditor;
use faultline_server::store::{AuditStore, MemoryStore};

/// Complete test service with an in-memory store.
pub struct TestServer {
    pub store: Arc<dyn AuditStore>,
    pub state: AppState,
}

impl TestServer {
    /// Creates a new test service backed by a fresh in-memory store.
    pub fn new() -> Self {
        let store: Arc<dyn AuditStore> = Arc::new(MemoryStore::new());
        let auditor = Arc::new(Auditor::new(Arc::clone(&store), "test"));
        let state = AppState {
            store: Arc::clone(&store),
            auditor,
        };

        Self { store, state }
    }

    /// A fresh router over this service's state.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Send a JSON request and return the status plus parsed response body.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(body.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}
