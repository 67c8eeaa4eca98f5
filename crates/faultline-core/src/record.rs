//! Canonical error record types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned when parsing a classification value from its wire form.
#[derive(Debug, thiserror::Error)]
#[error("unrecognised {field}: {value}")]
pub struct ParseClassificationError {
    /// Which classification field failed to parse.
    pub field: &'static str,
    /// The rejected value.
    pub value: String,
}

/// Unique identifier for a persisted error record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditId(String);

impl AuditId {
    /// Create an audit ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique audit ID using ULID.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AuditId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which part of the system produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Backend request handling failure.
    ApiError,
    /// Client-side failure reported through the collection endpoint.
    UiError,
    /// Failure inside an external integration.
    ThirdPartyError,
}

impl ErrorKind {
    /// Wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiError => "API_ERROR",
            Self::UiError => "UI_ERROR",
            Self::ThirdPartyError => "THIRD_PARTY_ERROR",
        }
    }
}

impl FromStr for ErrorKind {
    type Err = ParseClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "API_ERROR" => Ok(Self::ApiError),
            "UI_ERROR" => Ok(Self::UiError),
            "THIRD_PARTY_ERROR" => Ok(Self::ThirdPartyError),
            other => Err(ParseClassificationError {
                field: "error_type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgent an error is. Drives external alerting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// All severities, most urgent first. Used for metrics rendering.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Critical, Self::High, Self::Medium, Self::Low]
    }
}

impl FromStr for Severity {
    type Err = ParseClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(ParseClassificationError {
                field: "severity",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tier of the deployment produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorOrigin {
    Backend,
    Frontend,
    External,
}

impl ErrorOrigin {
    /// Wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "BACKEND",
            Self::Frontend => "FRONTEND",
            Self::External => "EXTERNAL",
        }
    }
}

impl FromStr for ErrorOrigin {
    type Err = ParseClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BACKEND" => Ok(Self::Backend),
            "FRONTEND" => Ok(Self::Frontend),
            "EXTERNAL" => Ok(Self::External),
            other => Err(ParseClassificationError {
                field: "source",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted error record.
///
/// Created by the ingestion boundary from a [`NewErrorRecord`]; `id` and
/// `created_at` are assigned exactly once at that point. The resolution
/// fields are the only part of a record that changes after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Unique record identifier.
    pub id: AuditId,
    /// Origin classification.
    pub error_type: ErrorKind,
    /// Urgency classification.
    pub severity: Severity,
    /// Producing tier.
    pub source: ErrorOrigin,
    /// Caller-supplied stable code (e.g. `API_CALL_FAILED`).
    pub error_code: String,
    /// Human-readable message.
    pub error_message: String,
    /// Stack trace, when the producing runtime exposed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Failing endpoint or page location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// HTTP method, for API-originated errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    /// HTTP status, for API-originated errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<i32>,
    /// User agent captured at the ingestion boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Peer address captured at the ingestion boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Free-form metadata. See [`crate::metadata::ErrorMetadata`] for the
    /// typed shapes known codes carry.
    #[serde(default)]
    pub context_data: Map<String, Value>,
    /// Deployment tier the error was produced in.
    pub environment: String,
    /// Opaque reference to an externally owned identity. Never validated here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Client-instance session identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Correlates to a specific inbound request, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Assigned once at ingestion, immutable.
    pub created_at: DateTime<Utc>,
    /// Resolution flag. One-way false to true.
    pub resolved: bool,
    /// Stamped together with `resolved_by` on the first resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved the record. Opaque identity reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
}

/// Validation failure for a record presented at the ingestion boundary.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A required field was missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// A record as presented to the ingestion boundary, before an identifier and
/// `created_at` have been assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewErrorRecord {
    pub error_type: ErrorKind,
    pub severity: Severity,
    pub source: ErrorOrigin,
    pub error_code: String,
    pub error_message: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub http_status: Option<i32>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub context_data: Map<String, Value>,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

fn default_environment() -> String {
    "production".to_owned()
}

impl NewErrorRecord {
    /// Create a record draft with the required classification fields.
    #[must_use]
    pub fn new(
        error_type: ErrorKind,
        severity: Severity,
        source: ErrorOrigin,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            severity,
            source,
            error_code: error_code.into(),
            error_message: error_message.into(),
            stack_trace: None,
            endpoint: None,
            http_method: None,
            http_status: None,
            user_agent: None,
            ip_address: None,
            context_data: Map::new(),
            environment: default_environment(),
            user_id: None,
            session_id: None,
            request_id: None,
        }
    }

    /// Attach a stack trace.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Attach the failing endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Attach HTTP method and status.
    #[must_use]
    pub fn with_http(mut self, method: impl Into<String>, status: i32) -> Self {
        self.http_method = Some(method.into());
        self.http_status = Some(status);
        self
    }

    /// Attach the requesting user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Attach the peer address.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    /// Attach free-form metadata.
    #[must_use]
    pub fn with_context(mut self, context_data: Map<String, Value>) -> Self {
        self.context_data = context_data;
        self
    }

    /// Set the deployment tier.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Attach the acting user.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach the client session.
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach the correlated request.
    #[must_use]
    pub fn with_request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Check the invariants the ingestion boundary enforces.
    ///
    /// The classification enums are present by construction; the message is
    /// the one field that can arrive empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.error_message.trim().is_empty() {
            return Err(ValidationError::MissingField("error_message"));
        }
        Ok(())
    }

    /// Promote the draft into a persisted record.
    ///
    /// Assigns the identifier and `created_at`; the resolution fields start
    /// cleared.
    #[must_use]
    pub fn into_record(self) -> ErrorRecord {
        ErrorRecord {
            id: AuditId::generate(),
            error_type: self.error_type,
            severity: self.severity,
            source: self.source,
            error_code: self.error_code,
            error_message: self.error_message,
            stack_trace: self.stack_trace,
            endpoint: self.endpoint,
            http_method: self.http_method,
            http_status: self.http_status,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            context_data: self.context_data,
            environment: self.environment,
            user_id: self.user_id,
            session_id: self.session_id,
            request_id: self.request_id,
            created_at: Utc::now(),
            resolved: false,
            resolved_at: None,
            resolved_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_roundtrips() {
        for kind in [
            ErrorKind::ApiError,
            ErrorKind::UiError,
            ErrorKind::ThirdPartyError,
        ] {
            assert_eq!(kind.as_str().parse::<ErrorKind>().unwrap(), kind);
        }
        for severity in Severity::all() {
            assert_eq!(severity.as_str().parse::<Severity>().unwrap(), severity);
        }
        for origin in [
            ErrorOrigin::Backend,
            ErrorOrigin::Frontend,
            ErrorOrigin::External,
        ] {
            assert_eq!(origin.as_str().parse::<ErrorOrigin>().unwrap(), origin);
        }
    }

    #[test]
    fn unknown_classification_rejected() {
        let err = "NOT_A_KIND".parse::<ErrorKind>().unwrap_err();
        assert_eq!(err.field, "error_type");
        assert_eq!(err.value, "NOT_A_KIND");
    }

    #[test]
    fn empty_message_fails_validation() {
        let draft = NewErrorRecord::new(
            ErrorKind::UiError,
            Severity::Medium,
            ErrorOrigin::Frontend,
            "UI_ERROR",
            "   ",
        );
        assert!(draft.validate().is_err());
    }

    #[test]
    fn into_record_assigns_identity_and_clears_resolution() {
        let record = NewErrorRecord::new(
            ErrorKind::ApiError,
            Severity::High,
            ErrorOrigin::Backend,
            "API_CALL_FAILED",
            "boom",
        )
        .with_http("GET", 502)
        .with_endpoint("/bookings")
        .into_record();

        assert!(!record.id.as_str().is_empty());
        assert!(!record.resolved);
        assert!(record.resolved_at.is_none());
        assert!(record.resolved_by.is_none());
        assert_eq!(record.http_status, Some(502));
        assert_eq!(record.environment, "production");
    }

    #[test]
    fn audit_ids_are_unique() {
        let a = AuditId::generate();
        let b = AuditId::generate();
        assert_ne!(a, b);
    }
}
