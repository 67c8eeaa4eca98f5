//! Canonical types for the faultline error-telemetry pipeline.
//!
//! This crate holds everything the capture client and the collection service
//! agree on: the persisted [`ErrorRecord`] and its classification enums, the
//! typed [`metadata::ErrorMetadata`] shapes known error codes carry, the
//! [`ErrorReport`] wire payload accepted by the collection endpoint, and the
//! identifier helpers both sides use. It performs no I/O.

#![forbid(unsafe_code)]

pub mod codes;
pub mod metadata;
pub mod record;
pub mod report;
pub mod session;

pub use metadata::{
    ApiCallContext, ErrorMetadata, IntegrationContext, RejectionContext, ScriptContext,
};
pub use record::{
    AuditId, ErrorKind, ErrorOrigin, ErrorRecord, NewErrorRecord, ParseClassificationError,
    Severity, ValidationError,
};
pub use report::ErrorReport;
pub use session::{generate_request_id, generate_session_id};
