//! Wire payload for the collection endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /error-audit/ui-error`.
///
/// This is the contract shared with every client of the collection endpoint,
/// regardless of implementation language. All keys are always present;
/// optional values are serialised as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human-readable message. The one field the server requires.
    pub error_message: String,
    /// Stable code identifying the failure shape.
    pub error_code: Option<String>,
    /// Stack trace, when the producing runtime exposed one.
    pub stack_trace: Option<String>,
    /// Location the failure was observed at.
    pub page_url: String,
    /// Free-form metadata keyed by `error_code`.
    pub metadata: Map<String, Value>,
    /// Acting user at send time, if known.
    pub user_id: Option<String>,
    /// Client-instance session identifier.
    pub session_id: String,
    /// Assigned at send time, not capture time.
    pub timestamp: DateTime<Utc>,
    /// Reporting client's user agent.
    pub user_agent: String,
}
