//! Process-wide interception of otherwise-unhandled failures.
//!
//! Registration is a single setup call owned by the composing application;
//! it is not idempotent, so install each hook once. The hooks only add
//! reporting as a side effect — the environment's own failure handling runs
//! first and is never suppressed or altered.

use faultline_core::metadata::ScriptContext;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::client::FaultlineClient;
use crate::normalise::panic_message;

/// Install a process-wide panic hook that reports uncaught failures.
///
/// The previously installed hook (including the default backtrace printer)
/// runs first, unaltered; the report is forwarded afterwards. Reporting is
/// fire-and-forget and cannot re-enter the panicking path.
pub fn install_panic_hook(client: FaultlineClient) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);

        let message = panic_message(info.payload()).map(ToOwned::to_owned);
        let context = info
            .location()
            .map(|location| ScriptContext {
                file: Some(location.file().to_owned()),
                line: Some(location.line()),
                column: Some(location.column()),
            })
            .unwrap_or_default();

        client.report_uncaught(message.as_deref(), context);
    }));
}

/// Observe a spawned task and report its failure as an unhandled rejection.
///
/// A panicked or cancelled task is normalised into a rejection report; a
/// successful task's value is passed through. The watcher never affects the
/// watched task itself.
pub fn watch<T>(client: &FaultlineClient, handle: JoinHandle<T>) -> JoinHandle<Option<T>>
where
    T: Send + 'static,
{
    let client = client.clone();
    tokio::spawn(async move {
        match handle.await {
            Ok(value) => Some(value),
            Err(join_error) => {
                let reason = if join_error.is_cancelled() {
                    Value::String("task cancelled".to_owned())
                } else {
                    let payload = join_error.into_panic();
                    match panic_message(&*payload) {
                        Some(message) => Value::String(message.to_owned()),
                        None => Value::Null,
                    }
                };
                client.report_rejection(reason);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::sink::test_support::RecordingSink;
    use crate::sink::FallbackSink;
    use std::sync::Arc;

    fn sink_backed_client() -> (FaultlineClient, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let config = ClientConfig::new("http://127.0.0.1:1").with_timeout_secs(1);
        let client =
            FaultlineClient::with_sink(config, Arc::clone(&sink) as Arc<dyn FallbackSink>)
                .expect("client construction failed");
        (client, sink)
    }

    #[tokio::test]
    async fn watched_panic_is_reported_as_rejection() {
        let (client, sink) = sink_backed_client();

        let handle = tokio::spawn(async {
            panic!("task exploded");
        });

        let outcome = watch(&client, handle).await.expect("watcher panicked");
        assert!(outcome.is_none());

        sink.wait_for(1).await;
        let reports = sink.drain();
        assert_eq!(reports[0].0.error_code.as_deref(), Some("PROMISE_REJECTION"));
        assert_eq!(reports[0].0.error_message, "task exploded");
    }

    #[tokio::test]
    async fn watched_success_passes_value_through() {
        let (client, sink) = sink_backed_client();

        let handle = tokio::spawn(async { 21 * 2 });
        let outcome = watch(&client, handle).await.expect("watcher panicked");

        assert_eq!(outcome, Some(42));
        assert!(sink.drain().is_empty());
    }

    #[tokio::test]
    async fn watched_cancellation_is_reported() {
        let (client, sink) = sink_backed_client();

        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        handle.abort();

        let outcome = watch(&client, handle).await.expect("watcher panicked");
        assert!(outcome.is_none());

        sink.wait_for(1).await;
        let reports = sink.drain();
        assert_eq!(reports[0].0.error_message, "task cancelled");
    }
}
