//! Server-side error capture.
//!
//! The [`Auditor`] records backend and third-party failures directly into
//! the store, bypassing the collection endpoint. Recording swallows its own
//! failures: auditing must never break request serving.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use faultline_core::{codes, ErrorKind, ErrorOrigin, NewErrorRecord, Severity};

use crate::store::AuditStore;

/// A backend request-handling failure to record.
#[derive(Debug, Clone)]
pub struct ApiErrorEvent {
    /// Human-readable message.
    pub message: String,
    /// Stable code identifying the failure shape.
    pub error_code: String,
    /// Failing endpoint path.
    pub endpoint: String,
    /// HTTP method of the failing request.
    pub http_method: String,
    /// Response status of the failing request.
    pub http_status: i32,
    /// Whether the failure was caused by invalid caller input. Only affects
    /// severity when the status alone is inconclusive.
    pub invalid_input: bool,
    /// Stack trace, when one is available.
    pub stack_trace: Option<String>,
    /// Acting user, if known.
    pub user_id: Option<String>,
    /// Correlated inbound request.
    pub request_id: Option<String>,
    /// Requesting user agent.
    pub user_agent: Option<String>,
    /// Requesting peer address.
    pub ip_address: Option<String>,
    /// Free-form request context.
    pub context: Map<String, Value>,
}

impl ApiErrorEvent {
    /// Create an event for a failing endpoint.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        endpoint: impl Into<String>,
        http_method: impl Into<String>,
        http_status: i32,
    ) -> Self {
        Self {
            message: message.into(),
            error_code: "API_ERROR".to_owned(),
            endpoint: endpoint.into(),
            http_method: http_method.into(),
            http_status,
            invalid_input: false,
            stack_trace: None,
            user_id: None,
            request_id: None,
            user_agent: None,
            ip_address: None,
            context: Map::new(),
        }
    }

    /// Override the error code.
    #[must_use]
    pub fn with_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = error_code.into();
        self
    }

    /// Mark the failure as caused by invalid caller input.
    #[must_use]
    pub const fn with_invalid_input(mut self) -> Self {
        self.invalid_input = true;
        self
    }

    /// Attach a stack trace.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Attach the acting user.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach the correlated request.
    #[must_use]
    pub fn with_request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach the requesting user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Attach the requesting peer address.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    /// Attach free-form request context.
    #[must_use]
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}

/// A third-party integration failure to record.
#[derive(Debug, Clone)]
pub struct ThirdPartyEvent {
    /// The failing service.
    pub service_name: String,
    /// The service's own failure message, unprefixed.
    pub message: String,
    /// Stable code identifying the failure shape.
    pub error_code: Option<String>,
    /// HTTP status returned by the service, when the failure was HTTP-shaped.
    pub http_status: Option<i32>,
    /// Acting user, if known.
    pub user_id: Option<String>,
    /// Correlated inbound request.
    pub request_id: Option<String>,
    /// Further caller-supplied detail.
    pub context: Map<String, Value>,
}

impl ThirdPartyEvent {
    /// Create an event for a failing service.
    #[must_use]
    pub fn new(service_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            message: message.into(),
            error_code: None,
            http_status: None,
            user_id: None,
            request_id: None,
            context: Map::new(),
        }
    }

    /// Override the error code.
    #[must_use]
    pub fn with_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    /// Attach the status returned by the service.
    #[must_use]
    pub const fn with_status(mut self, http_status: i32) -> Self {
        self.http_status = Some(http_status);
        self
    }

    /// Attach the acting user.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach the correlated request.
    #[must_use]
    pub fn with_request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach further detail.
    #[must_use]
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}

/// Records backend and third-party failures into the audit store.
pub struct Auditor {
    store: Arc<dyn AuditStore>,
    environment: String,
}

impl Auditor {
    /// Create an auditor writing to the given store.
    #[must_use]
    pub fn new(store: Arc<dyn AuditStore>, environment: impl Into<String>) -> Self {
        Self {
            store,
            environment: environment.into(),
        }
    }

    /// Record a backend request-handling failure.
    ///
    /// Store failures are logged and swallowed.
    pub async fn record_api_error(&self, event: ApiErrorEvent) {
        let severity = severity_for(event.http_status, event.invalid_input);

        let mut record = NewErrorRecord::new(
            ErrorKind::ApiError,
            severity,
            ErrorOrigin::Backend,
            event.error_code,
            event.message,
        )
        .with_endpoint(event.endpoint.clone())
        .with_http(event.http_method, event.http_status)
        .with_context(event.context)
        .with_environment(self.environment.clone());

        record.stack_trace = event.stack_trace;
        record.user_id = event.user_id;
        record.request_id = event.request_id;
        record.user_agent = event.user_agent;
        record.ip_address = event.ip_address;

        match self.store.insert(record).await {
            Ok(stored) => info!(
                error_audit_id = %stored.id,
                endpoint = %event.endpoint,
                severity = %stored.severity,
                "API error recorded"
            ),
            Err(e) => warn!(error = %e, "failed to record API error"),
        }
    }

    /// Record a third-party integration failure.
    ///
    /// The message is prefixed with the service name and the service is kept
    /// in the record's context. Store failures are logged and swallowed.
    pub async fn record_third_party_error(&self, event: ThirdPartyEvent) {
        let severity = match event.http_status {
            Some(status) if status >= 500 => Severity::High,
            _ => Severity::Medium,
        };
        let error_code = event
            .error_code
            .unwrap_or_else(|| codes::THIRD_PARTY_ERROR.to_owned());

        let mut context = event.context;
        context.insert(
            "service_name".to_owned(),
            Value::String(event.service_name.clone()),
        );

        let mut record = NewErrorRecord::new(
            ErrorKind::ThirdPartyError,
            severity,
            ErrorOrigin::External,
            error_code,
            format!("{}: {}", event.service_name, event.message),
        )
        .with_context(context)
        .with_environment(self.environment.clone());

        if let Some(status) = event.http_status {
            record.http_status = Some(status);
        }
        record.user_id = event.user_id;
        record.request_id = event.request_id;

        match self.store.insert(record).await {
            Ok(stored) => info!(
                error_audit_id = %stored.id,
                service = %event.service_name,
                severity = %stored.severity,
                "third-party error recorded"
            ),
            Err(e) => warn!(error = %e, "failed to record third-party error"),
        }
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

fn severity_for(http_status: i32, invalid_input: bool) -> Severity {
    if http_status >= 500 {
        Severity::Critical
    } else if http_status >= 400 {
        Severity::High
    } else if invalid_input {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ErrorFilter, MemoryStore};

    fn auditor_with_store() -> (Auditor, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let auditor = Auditor::new(Arc::clone(&store) as Arc<dyn AuditStore>, "test");
        (auditor, store)
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(severity_for(503, false), Severity::Critical);
        assert_eq!(severity_for(500, true), Severity::Critical);
        assert_eq!(severity_for(404, false), Severity::High);
        assert_eq!(severity_for(200, true), Severity::Medium);
        assert_eq!(severity_for(200, false), Severity::Low);
    }

    #[tokio::test]
    async fn api_error_is_classified_and_stored() {
        let (auditor, store) = auditor_with_store();

        auditor
            .record_api_error(
                ApiErrorEvent::new("boom", "/bookings", "POST", 502)
                    .with_user("user-1")
                    .with_request("req-1"),
            )
            .await;

        let records = store.list(&ErrorFilter::new()).await.expect("list failed");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.error_type, ErrorKind::ApiError);
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.source, ErrorOrigin::Backend);
        assert_eq!(record.http_status, Some(502));
        assert_eq!(record.environment, "test");
        assert_eq!(record.request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn third_party_error_formats_message_and_context() {
        let (auditor, store) = auditor_with_store();

        auditor
            .record_third_party_error(
                ThirdPartyEvent::new("sms-gateway", "quota exceeded").with_status(503),
            )
            .await;

        let records = store.list(&ErrorFilter::new()).await.expect("list failed");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.error_message, "sms-gateway: quota exceeded");
        assert_eq!(record.error_code, "THIRD_PARTY_ERROR");
        assert_eq!(record.severity, Severity::High);
        assert_eq!(
            record.context_data["service_name"],
            Value::String("sms-gateway".to_owned())
        );
    }

    #[tokio::test]
    async fn recording_swallows_store_failures() {
        // A record that fails validation exercises the swallow path; the
        // call must return normally.
        let (auditor, store) = auditor_with_store();

        auditor
            .record_api_error(ApiErrorEvent::new("", "/x", "GET", 500))
            .await;

        let records = store.list(&ErrorFilter::new()).await.expect("list failed");
        assert!(records.is_empty());
    }
}
