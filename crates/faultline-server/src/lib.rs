//! Faultline collection service.
//!
//! This crate is the server side of the error-telemetry pipeline. It exposes
//! the collection endpoint capture clients post reports to, generic and
//! batch ingestion for callers that classify their own errors, a query API
//! over the audit store, and the resolution workflow.
//!
//! # Architecture
//!
//! - [`store`] — the [`store::AuditStore`] trait with PostgreSQL and
//!   in-memory implementations. Validation happens at the ingestion
//!   boundary; a record missing its message is rejected, not dropped.
//! - [`api`] — the axum router, including health/readiness/metrics and the
//!   request-audit middleware that stamps request identifiers and records
//!   5xx responses.
//! - [`auditor`] — server-side capture of backend and third-party failures,
//!   with severity derived from the HTTP status. Recording swallows its own
//!   failures so auditing can never break serving.
//!
//! Resolution is one-way: `resolved_at` and `resolved_by` are stamped
//! together on the first resolve and never re-stamped; resolving again is a
//! no-op, and there is no unresolve.

#![forbid(unsafe_code)]

pub mod api;
pub mod auditor;
pub mod config;
pub mod error;
pub mod store;

pub use api::{router, AppState};
pub use auditor::{ApiErrorEvent, Auditor, ThirdPartyEvent};
pub use config::{AuditConfig, DatabaseConfig, HttpConfig, ServerConfig};
pub use error::{AuditError, AuditResult};
pub use store::{AuditStore, ErrorFilter, MemoryStore, PostgresStore};
