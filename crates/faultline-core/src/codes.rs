//! Stable wire codes shared with every client of the collection endpoint.
//!
//! These strings are part of the endpoint contract; non-Rust clients send the
//! same values, so they must not change.

/// Uncaught synchronous failure in the client execution context.
pub const UNCAUGHT_ERROR: &str = "JS_ERROR";

/// Unhandled asynchronous rejection.
pub const UNHANDLED_REJECTION: &str = "PROMISE_REJECTION";

/// Failed outbound call to a backend endpoint.
pub const API_CALL_FAILED: &str = "API_CALL_FAILED";

/// Third-party integration failure.
pub const THIRD_PARTY_ERROR: &str = "THIRD_PARTY_ERROR";

/// Client-side error reported without a more specific code.
pub const UI_ERROR: &str = "UI_ERROR";

/// Message used when a rejection reason carries no message of its own.
pub const REJECTION_FALLBACK_MESSAGE: &str = "Unhandled Promise Rejection";

/// Prefix applied to the message of every failed outbound call.
pub const API_ERROR_PREFIX: &str = "API Error: ";
