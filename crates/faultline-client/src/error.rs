//! Error types for the capture client.
//!
//! These never reach application code through the reporting path; they exist
//! to classify delivery failures for the fallback sink and to surface
//! construction problems from [`crate::FaultlineClient::new`].

/// Result type alias using [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised inside the capture client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport failure before a response was received.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collection endpoint answered with a non-success status.
    #[error("collection endpoint rejected report: {0}")]
    EndpointRejected(reqwest::StatusCode),

    /// No async runtime was available to dispatch the send.
    #[error("no async runtime available for dispatch")]
    NoRuntime,
}
