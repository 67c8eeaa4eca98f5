//! Conversion of raw failure shapes into canonical captured errors.
//!
//! Each function here is pure and infallible: malformed or partial input
//! degrades to documented defaults instead of failing. The produced
//! [`CapturedError`] is enriched with session identity and send-time fields
//! by [`crate::FaultlineClient`] at dispatch.

use std::any::Any;

use faultline_core::codes;
use faultline_core::metadata::{
    ApiCallContext, ErrorMetadata, IntegrationContext, RejectionContext, ScriptContext,
};
use serde_json::{Map, Value};

/// Message used when an uncaught failure carries no payload we can read.
const UNCAUGHT_FALLBACK_MESSAGE: &str = "Uncaught error";

/// A failure normalised into the canonical shape, before enrichment.
#[derive(Debug, Clone)]
pub struct CapturedError {
    /// Stable code identifying the failure shape.
    pub error_code: String,
    /// Human-readable message. Never empty.
    pub error_message: String,
    /// Stack trace, when the failure exposed one.
    pub stack_trace: Option<String>,
    /// Typed metadata for the failure shape.
    pub metadata: ErrorMetadata,
}

/// Normalise an uncaught synchronous failure.
///
/// `message` is the failure's own message when one could be read; `context`
/// carries the source position when the runtime exposed it.
#[must_use]
pub fn uncaught(message: Option<&str>, context: ScriptContext) -> CapturedError {
    let error_message = match message {
        Some(m) if !m.trim().is_empty() => m.to_owned(),
        _ => UNCAUGHT_FALLBACK_MESSAGE.to_owned(),
    };

    CapturedError {
        error_code: codes::UNCAUGHT_ERROR.to_owned(),
        error_message,
        stack_trace: None,
        metadata: ErrorMetadata::Script(context),
    }
}

/// Normalise an unhandled asynchronous rejection.
///
/// The rejection reason may be any value. A string reason becomes the
/// message; an object reason contributes its `message` and `stack` fields
/// when present. Anything else falls back to the fixed rejection message.
/// The raw reason is always preserved in the metadata.
#[must_use]
pub fn rejection(reason: Value) -> CapturedError {
    let error_message = rejection_message(&reason)
        .unwrap_or_else(|| codes::REJECTION_FALLBACK_MESSAGE.to_owned());
    let stack_trace = reason
        .get("stack")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    CapturedError {
        error_code: codes::UNHANDLED_REJECTION.to_owned(),
        error_message,
        stack_trace,
        metadata: ErrorMetadata::Rejection(RejectionContext { reason }),
    }
}

fn rejection_message(reason: &Value) -> Option<String> {
    match reason {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(ToOwned::to_owned),
        _ => None,
    }
}

/// Normalise a failed outbound call.
///
/// `status` is `None` when the call never reached the network; the recorded
/// status is then 0 to distinguish transport failures from HTTP errors.
#[must_use]
pub fn api_failure(
    endpoint: impl Into<String>,
    method: impl Into<String>,
    status: Option<u16>,
    payload: Option<Value>,
    message: &str,
) -> CapturedError {
    let endpoint = endpoint.into();
    CapturedError {
        error_code: codes::API_CALL_FAILED.to_owned(),
        error_message: format!("{}{message}", codes::API_ERROR_PREFIX),
        stack_trace: None,
        metadata: ErrorMetadata::ApiCall(ApiCallContext {
            endpoint,
            method: method.into(),
            status: status.unwrap_or(0),
            payload,
        }),
    }
}

/// Normalise a third-party integration failure.
///
/// The message is prefixed with the failing service's name; `error_code`
/// falls back to the generic third-party code when the caller supplies none.
#[must_use]
pub fn third_party(
    service_name: impl Into<String>,
    message: &str,
    error_code: Option<&str>,
    extra: Map<String, Value>,
) -> CapturedError {
    let service_name = service_name.into();
    CapturedError {
        error_code: error_code.unwrap_or(codes::THIRD_PARTY_ERROR).to_owned(),
        error_message: format!("{service_name}: {message}"),
        stack_trace: None,
        metadata: ErrorMetadata::Integration(IntegrationContext {
            service_name,
            extra,
        }),
    }
}

/// Read the message out of a panic payload, when it carries one.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    if let Some(s) = payload.downcast_ref::<&str>() {
        Some(s)
    } else {
        payload.downcast_ref::<String>().map(String::as_str)
    }
}
