//! Typed metadata shapes for known error codes.
//!
//! Metadata travels the wire as a free-form JSON object, but the shape is
//! determined by the record's `error_code`. Known codes get a typed
//! representation; anything else degrades to an opaque key-value bag.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codes;

/// Source position for an uncaught failure, when the runtime exposed one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptContext {
    /// Source file of the failure site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Column number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Raw rejection value for an unhandled asynchronous rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionContext {
    /// The rejection reason as supplied. May be any JSON value.
    pub reason: Value,
}

/// Call details for a failed outbound API call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCallContext {
    /// Endpoint the call targeted.
    pub endpoint: String,
    /// HTTP method.
    pub method: String,
    /// Response status. 0 when the call never reached the network.
    pub status: u16,
    /// The original request payload, when the caller supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Details of a third-party integration failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationContext {
    /// The failing service.
    pub service_name: String,
    /// Any further caller-supplied detail.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata for one error, tagged by the error code that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMetadata {
    /// Uncaught synchronous failure.
    Script(ScriptContext),
    /// Unhandled asynchronous rejection.
    Rejection(RejectionContext),
    /// Failed outbound API call.
    ApiCall(ApiCallContext),
    /// Third-party integration failure.
    Integration(IntegrationContext),
    /// Unrecognised code; kept as-is.
    Bag(Map<String, Value>),
}

impl ErrorMetadata {
    /// Recover the typed shape for `error_code` from wire-form metadata.
    ///
    /// Falls back to [`ErrorMetadata::Bag`] when the code is unrecognised or
    /// the object does not match the expected shape.
    #[must_use]
    pub fn from_parts(error_code: &str, data: Map<String, Value>) -> Self {
        let value = Value::Object(data);
        let parsed = match error_code {
            codes::UNCAUGHT_ERROR => {
                serde_json::from_value::<ScriptContext>(value.clone()).map(Self::Script)
            }
            codes::UNHANDLED_REJECTION => {
                serde_json::from_value::<RejectionContext>(value.clone()).map(Self::Rejection)
            }
            codes::API_CALL_FAILED => {
                serde_json::from_value::<ApiCallContext>(value.clone()).map(Self::ApiCall)
            }
            codes::THIRD_PARTY_ERROR => {
                serde_json::from_value::<IntegrationContext>(value.clone()).map(Self::Integration)
            }
            _ => return Self::bag_from(value),
        };

        parsed.unwrap_or_else(|_| Self::bag_from(value))
    }

    /// Flatten back to the wire form.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        let value = match self {
            Self::Script(ctx) => serde_json::to_value(ctx),
            Self::Rejection(ctx) => serde_json::to_value(ctx),
            Self::ApiCall(ctx) => serde_json::to_value(ctx),
            Self::Integration(ctx) => serde_json::to_value(ctx),
            Self::Bag(map) => return map,
        };

        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    fn bag_from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Bag(map),
            _ => Self::Bag(Map::new()),
        }
    }
}
