//! Local fallback for reports the transport could not deliver.

use faultline_core::ErrorReport;

use crate::error::ClientError;

/// Destination for reports whose delivery failed.
///
/// The sink is the only observable footprint of a telemetry-channel outage:
/// delivery failures never propagate to application code, they land here.
/// Implementations must not panic and should return quickly.
pub trait FallbackSink: Send + Sync {
    /// Receive one undeliverable report and the failure that stranded it.
    fn emit(&self, report: &ErrorReport, reason: &ClientError);
}

/// Default sink: writes the lost report through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl FallbackSink for TracingSink {
    fn emit(&self, report: &ErrorReport, reason: &ClientError) {
        let payload = serde_json::to_string(report).unwrap_or_else(|_| report.error_message.clone());
        tracing::error!(
            reason = %reason,
            session_id = %report.session_id,
            payload = %payload,
            "telemetry delivery failed, report dropped to local sink"
        );
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::{ClientError, ErrorReport, FallbackSink};

    /// Sink that records every stranded report for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        reports: Mutex<Vec<(ErrorReport, String)>>,
    }

    impl RecordingSink {
        pub fn drain(&self) -> Vec<(ErrorReport, String)> {
            self.reports
                .lock()
                .map(|mut guard| std::mem::take(&mut *guard))
                .unwrap_or_default()
        }

        fn len(&self) -> usize {
            self.reports.lock().map(|guard| guard.len()).unwrap_or(0)
        }

        /// Poll until at least `count` reports have landed.
        pub async fn wait_for(&self, count: usize) {
            while self.len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    }

    impl FallbackSink for RecordingSink {
        fn emit(&self, report: &ErrorReport, reason: &ClientError) {
            if let Ok(mut guard) = self.reports.lock() {
                guard.push((report.clone(), reason.to_string()));
            }
        }
    }
}
