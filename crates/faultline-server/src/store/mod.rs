//! Audit record storage backends.
//!
//! This module provides the trait and implementations for persisting error
//! records. The primary implementation uses PostgreSQL; an in-memory
//! implementation is provided for testing and degraded startup.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use faultline_core::{AuditId, ErrorKind, ErrorRecord, NewErrorRecord, Severity};

use crate::error::AuditResult;

/// Filter criteria for listing error records.
///
/// Every field combines with `created_at` ordering; the store keeps an index
/// per filterable column for exactly this access pattern.
#[derive(Debug, Clone, Default)]
pub struct ErrorFilter {
    /// Filter by origin classification.
    pub error_type: Option<ErrorKind>,
    /// Filter by urgency classification.
    pub severity: Option<Severity>,
    /// Filter by acting user.
    pub user_id: Option<String>,
    /// Filter by failing endpoint.
    pub endpoint: Option<String>,
    /// Filter by resolution state.
    pub resolved: Option<bool>,
    /// Only records created at or after this instant.
    pub start_time: Option<DateTime<Utc>>,
    /// Only records created before this instant.
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

impl ErrorFilter {
    /// Create a new empty filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            error_type: None,
            severity: None,
            user_id: None,
            endpoint: None,
            resolved: None,
            start_time: None,
            end_time: None,
            limit: None,
            offset: None,
        }
    }

    /// Filter by origin classification.
    #[must_use]
    pub const fn with_error_type(mut self, error_type: ErrorKind) -> Self {
        self.error_type = Some(error_type);
        self
    }

    /// Filter by urgency classification.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Filter by acting user.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Filter by failing endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Filter by resolution state.
    #[must_use]
    pub const fn with_resolved(mut self, resolved: bool) -> Self {
        self.resolved = Some(resolved);
        self
    }

    /// Only records created at or after the given instant.
    #[must_use]
    pub const fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Only records created before the given instant.
    #[must_use]
    pub const fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Set maximum results.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set pagination offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Backend for storing error records.
///
/// Each error produces a new row, so concurrent writers never contend on the
/// same logical record; the resolution workflow is the only post-ingestion
/// mutation and is idempotent.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Validate and persist one record.
    ///
    /// Assigns the identifier and `created_at`. A record missing a required
    /// field is rejected with a validation error, not silently dropped.
    async fn insert(&self, record: NewErrorRecord) -> AuditResult<ErrorRecord>;

    /// Validate and persist a batch of records.
    ///
    /// All records are validated before any is written; identifiers are
    /// returned in input order.
    async fn insert_batch(&self, records: Vec<NewErrorRecord>) -> AuditResult<Vec<AuditId>>;

    /// Get a record by ID.
    ///
    /// Returns `None` if the record does not exist.
    async fn get(&self, id: &AuditId) -> AuditResult<Option<ErrorRecord>>;

    /// List records matching the filter criteria.
    ///
    /// Results are ordered by `created_at` descending (newest first).
    async fn list(&self, filter: &ErrorFilter) -> AuditResult<Vec<ErrorRecord>>;

    /// Mark a record resolved, stamping `resolved_at` and `resolved_by`
    /// atomically with the flag.
    ///
    /// Resolving an already-resolved record is a no-op that returns the
    /// record with its original stamps. An unknown id is an error.
    async fn resolve(&self, id: &AuditId, resolved_by: &str) -> AuditResult<ErrorRecord>;

    /// Delete records created before the cutoff, returning how many were
    /// removed.
    ///
    /// This is the touchpoint for external age-based retention automation;
    /// nothing inside the service schedules it.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AuditResult<u64>;
}
