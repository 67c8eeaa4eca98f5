//! Fire-and-forget delivery to the collection endpoint.

use std::sync::Arc;
use std::time::Duration;

use faultline_core::ErrorReport;
use reqwest::Client;
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::sink::FallbackSink;

/// Delivers reports to the collection endpoint.
///
/// One attempt is made per report. Any failure of the channel itself is
/// routed to the fallback sink; nothing propagates to the caller, and the
/// caller is never blocked on the outcome.
#[derive(Clone)]
pub struct Transmitter {
    client: Client,
    endpoint: String,
    sink: Arc<dyn FallbackSink>,
}

impl Transmitter {
    /// Build a transmitter from client configuration.
    pub fn new(config: &ClientConfig, sink: Arc<dyn FallbackSink>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/error-audit/ui-error",
                config.base_url.trim_end_matches('/')
            ),
            sink,
        })
    }

    /// Hand a report to the transport and return immediately.
    ///
    /// The send runs on the ambient async runtime. Without a runtime there is
    /// nothing to drive the request, so the report goes straight to the sink.
    pub fn send(&self, report: ErrorReport) {
        match Handle::try_current() {
            Ok(handle) => {
                let transmitter = self.clone();
                handle.spawn(async move {
                    transmitter.deliver(report).await;
                });
            }
            Err(_) => self.sink.emit(&report, &ClientError::NoRuntime),
        }
    }

    /// Attempt one delivery, diverting any failure to the sink.
    pub async fn deliver(&self, report: ErrorReport) {
        match self.try_deliver(&report).await {
            Ok(()) => debug!(session_id = %report.session_id, "report delivered"),
            Err(reason) => self.sink.emit(&report, &reason),
        }
    }

    async fn try_deliver(&self, report: &ErrorReport) -> ClientResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(ClientError::Http)?;

        if !response.status().is_success() {
            return Err(ClientError::EndpointRejected(response.status()));
        }

        Ok(())
    }
}

impl std::fmt::Debug for Transmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transmitter")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::RecordingSink;
    use chrono::Utc;
    use serde_json::Map;

    fn test_report() -> ErrorReport {
        ErrorReport {
            error_message: "boom".to_owned(),
            error_code: Some("UI_ERROR".to_owned()),
            stack_trace: None,
            page_url: "app://test".to_owned(),
            metadata: Map::new(),
            user_id: None,
            session_id: "s-test".to_owned(),
            timestamp: Utc::now(),
            user_agent: "test-agent".to_owned(),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_lands_in_sink() {
        let sink = Arc::new(RecordingSink::default());
        let config = ClientConfig::new("http://127.0.0.1:1").with_timeout_secs(1);
        let transmitter =
            Transmitter::new(&config, Arc::clone(&sink) as Arc<dyn FallbackSink>).unwrap();

        transmitter.deliver(test_report()).await;

        let dropped = sink.drain();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].0.error_message, "boom");
        assert!(dropped[0].1.contains("http transport error"));
    }

    #[tokio::test]
    async fn send_returns_before_delivery_completes() {
        let sink = Arc::new(RecordingSink::default());
        let config = ClientConfig::new("http://127.0.0.1:1").with_timeout_secs(1);
        let transmitter =
            Transmitter::new(&config, Arc::clone(&sink) as Arc<dyn FallbackSink>).unwrap();

        let started = std::time::Instant::now();
        transmitter.send(test_report());
        transmitter.send(test_report());
        assert!(started.elapsed() < Duration::from_millis(100));

        sink.wait_for(2).await;
        assert_eq!(sink.drain().len(), 2);
    }

    #[test]
    fn send_without_runtime_goes_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let config = ClientConfig::new("http://127.0.0.1:1");
        let transmitter =
            Transmitter::new(&config, Arc::clone(&sink) as Arc<dyn FallbackSink>).unwrap();

        transmitter.send(test_report());

        let dropped = sink.drain();
        assert_eq!(dropped.len(), 1);
        assert!(dropped[0].1.contains("no async runtime"));
    }

    #[test]
    fn endpoint_path_joins_without_double_slash() {
        let sink = Arc::new(RecordingSink::default());
        let config = ClientConfig::new("http://collector:9000/");
        let transmitter = Transmitter::new(&config, sink as Arc<dyn FallbackSink>).unwrap();
        assert_eq!(
            transmitter.endpoint,
            "http://collector:9000/error-audit/ui-error"
        );
    }
}
