//! End-to-end capture tests against a live collection listener.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Json;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use faultline_client::{ClientConfig, FaultlineClient};
use faultline_core::ErrorReport;
use serde_json::json;
use tokio::sync::mpsc;

/// Start a collection endpoint on an ephemeral port that forwards every
/// received report to the returned channel.
async fn start_collector() -> (SocketAddr, mpsc::Receiver<ErrorReport>) {
    let (tx, rx) = mpsc::channel::<ErrorReport>(16);

    let app = Router::new().route(
        "/error-audit/ui-error",
        post(move |Json(report): Json<ErrorReport>| {
            let tx = tx.clone();
            async move {
                tx.send(report).await.ok();
                StatusCode::ACCEPTED
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve failed");
    });

    (addr, rx)
}

fn client_for(addr: SocketAddr) -> FaultlineClient {
    FaultlineClient::new(
        ClientConfig::new(format!("http://{addr}"))
            .with_timeout_secs(2)
            .with_page_url("app://test"),
    )
    .expect("client construction failed")
}

async fn receive(rx: &mut mpsc::Receiver<ErrorReport>) -> ErrorReport {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for report")
        .expect("collector channel closed")
}

#[tokio::test]
async fn reports_from_one_instance_share_a_session() {
    let (addr, mut rx) = start_collector().await;
    let client = client_for(addr);

    client.report_rejection(json!("first"));
    client.report_rejection(json!("second"));

    let first = receive(&mut rx).await;
    let second = receive(&mut rx).await;
    assert_eq!(first.session_id, second.session_id);

    let other_client = client_for(addr);
    other_client.report_rejection(json!("third"));
    let third = receive(&mut rx).await;
    assert_ne!(third.session_id, first.session_id);
}

#[tokio::test]
async fn identity_update_before_send_reaches_the_wire() {
    let (addr, mut rx) = start_collector().await;
    let client = client_for(addr);

    let captured = faultline_client::normalise::api_failure(
        "/bookings",
        "POST",
        Some(502),
        Some(json!({"vehicle_id": "v-1"})),
        "bad gateway",
    );
    client.set_user("user-99");
    client.send(captured);

    let report = receive(&mut rx).await;
    assert_eq!(report.user_id.as_deref(), Some("user-99"));
    assert_eq!(report.error_code.as_deref(), Some("API_CALL_FAILED"));
    assert_eq!(report.error_message, "API Error: bad gateway");
    assert_eq!(report.metadata["status"], json!(502));
    assert_eq!(report.page_url, "app://test");
}

#[tokio::test]
async fn sends_never_surface_failures_to_the_caller() {
    // Nothing listens on this address; both sends must return without error
    // and without blocking.
    let client = FaultlineClient::new(
        ClientConfig::new("http://127.0.0.1:1").with_timeout_secs(1),
    )
    .expect("client construction failed");

    let started = std::time::Instant::now();
    client.report_rejection(json!("lost"));
    client.report_api_failure("/x", "GET", None, None, "refused");
    assert!(started.elapsed() < Duration::from_millis(200));

    // Give the in-flight deliveries time to fail; the test passes by not
    // panicking and not propagating anything.
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn watched_task_failure_is_delivered() {
    let (addr, mut rx) = start_collector().await;
    let client = client_for(addr);

    let handle = tokio::spawn(async {
        panic!("background job failed");
    });
    faultline_client::watch(&client, handle)
        .await
        .expect("watcher panicked");

    let report = receive(&mut rx).await;
    assert_eq!(report.error_code.as_deref(), Some("PROMISE_REJECTION"));
    assert_eq!(report.error_message, "background job failed");
}
