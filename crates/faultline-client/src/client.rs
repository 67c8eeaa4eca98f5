//! The capture client tying normalisation, session state, and delivery together.

use std::sync::Arc;

use chrono::Utc;
use faultline_core::metadata::ScriptContext;
use faultline_core::ErrorReport;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::normalise::{self, CapturedError};
use crate::session::SessionContext;
use crate::sink::{FallbackSink, TracingSink};
use crate::transport::Transmitter;

/// In-process error capture client.
///
/// One instance owns one session: every report it sends carries the same
/// session identifier and the user identity current at send time. Reporting
/// is strictly side-channel — nothing here blocks the caller or propagates
/// a failure into application code.
///
/// # Example
///
/// ```no_run
/// use faultline_client::{ClientConfig, FaultlineClient};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FaultlineClient::new(ClientConfig::new("http://collector:8085"))?;
/// client.set_user("user-42");
/// client.report_api_failure("/bookings", "POST", Some(503), None, "upstream unavailable");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FaultlineClient {
    config: ClientConfig,
    session: SessionContext,
    transmitter: Transmitter,
}

impl FaultlineClient {
    /// Build a client with the default tracing fallback sink.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Build a client with a caller-supplied fallback sink.
    pub fn with_sink(config: ClientConfig, sink: Arc<dyn FallbackSink>) -> ClientResult<Self> {
        let session = match &config.session_id {
            Some(id) => SessionContext::with_session_id(id),
            None => SessionContext::new(),
        };
        let transmitter = Transmitter::new(&config, sink)?;

        Ok(Self {
            config,
            session,
            transmitter,
        })
    }

    /// The session identifier stamped on every report from this instance.
    #[must_use]
    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    /// Set the user identity for all subsequent sends.
    pub fn set_user(&self, user_id: impl Into<String>) {
        self.session.set_user(user_id);
    }

    /// Clear the user identity.
    pub fn clear_user(&self) {
        self.session.clear_user();
    }

    /// Send a previously captured error.
    ///
    /// Session identity, timestamp, user agent, and location are stamped now,
    /// not at capture time, so identity updates between capture and send are
    /// reflected in the payload.
    pub fn send(&self, captured: CapturedError) {
        self.send_from(captured, None);
    }

    /// Send a previously captured error with an explicit location label.
    pub fn send_from(&self, captured: CapturedError, page_url: Option<String>) {
        let report = ErrorReport {
            error_message: captured.error_message,
            error_code: Some(captured.error_code),
            stack_trace: captured.stack_trace,
            page_url: page_url.unwrap_or_else(|| self.config.page_url.clone()),
            metadata: captured.metadata.into_map(),
            user_id: self.session.user_id(),
            session_id: self.session.session_id().to_owned(),
            timestamp: Utc::now(),
            user_agent: self.config.user_agent.clone(),
        };

        self.transmitter.send(report);
    }

    /// Capture and send an uncaught synchronous failure.
    pub fn report_uncaught(&self, message: Option<&str>, context: ScriptContext) {
        self.send(normalise::uncaught(message, context));
    }

    /// Capture and send an unhandled asynchronous rejection.
    pub fn report_rejection(&self, reason: Value) {
        self.send(normalise::rejection(reason));
    }

    /// Capture and send a failed outbound call.
    ///
    /// Pass `status: None` for a transport-level failure that never reached
    /// the network; it is recorded as status 0.
    pub fn report_api_failure(
        &self,
        endpoint: impl Into<String>,
        method: impl Into<String>,
        status: Option<u16>,
        payload: Option<Value>,
        message: &str,
    ) {
        self.send(normalise::api_failure(endpoint, method, status, payload, message));
    }

    /// Capture and send a third-party integration failure.
    pub fn report_third_party(
        &self,
        service_name: impl Into<String>,
        message: &str,
        error_code: Option<&str>,
        extra: Map<String, Value>,
    ) {
        self.send(normalise::third_party(service_name, message, error_code, extra));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::RecordingSink;

    fn sink_backed_client() -> (FaultlineClient, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        // Port 1 refuses connections, so every send lands in the sink with
        // the fully stamped report.
        let config = ClientConfig::new("http://127.0.0.1:1").with_timeout_secs(1);
        let client =
            FaultlineClient::with_sink(config, Arc::clone(&sink) as Arc<dyn FallbackSink>)
                .expect("client construction failed");
        (client, sink)
    }

    #[tokio::test]
    async fn identity_update_between_capture_and_send_is_reflected() {
        let (client, sink) = sink_backed_client();

        let captured = normalise::api_failure("/x", "GET", Some(500), None, "boom");
        client.set_user("user-after-capture");
        client.send(captured);

        sink.wait_for(1).await;
        let reports = sink.drain();
        assert_eq!(reports[0].0.user_id.as_deref(), Some("user-after-capture"));
    }

    #[tokio::test]
    async fn reports_share_one_session_id() {
        let (client, sink) = sink_backed_client();

        client.report_rejection(serde_json::json!("a"));
        client.report_rejection(serde_json::json!("b"));

        sink.wait_for(2).await;
        let reports = sink.drain();
        assert_eq!(reports[0].0.session_id, reports[1].0.session_id);
        assert_eq!(reports[0].0.session_id, client.session_id());
    }

    #[tokio::test]
    async fn explicit_session_id_is_used_verbatim() {
        let sink = Arc::new(RecordingSink::default());
        let config = ClientConfig::new("http://127.0.0.1:1")
            .with_timeout_secs(1)
            .with_session_id("s-pinned");
        let client =
            FaultlineClient::with_sink(config, Arc::clone(&sink) as Arc<dyn FallbackSink>)
                .expect("client construction failed");

        assert_eq!(client.session_id(), "s-pinned");
    }

    #[tokio::test]
    async fn send_from_overrides_location() {
        let (client, sink) = sink_backed_client();

        client.send_from(
            normalise::uncaught(Some("boom"), ScriptContext::default()),
            Some("app://settings".to_owned()),
        );

        sink.wait_for(1).await;
        let reports = sink.drain();
        assert_eq!(reports[0].0.page_url, "app://settings");
    }
}
