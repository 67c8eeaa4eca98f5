//! Error types for the collection service.

use faultline_core::ValidationError;

/// Result type alias using [`AuditError`].
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors that can occur in the audit store and its API surface.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record presented at the ingestion boundary failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No record exists with the given identifier.
    #[error("error record not found: {0}")]
    RecordNotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuditError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a serialisation error.
    #[must_use]
    pub fn serialisation(msg: impl Into<String>) -> Self {
        Self::Serialisation(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
