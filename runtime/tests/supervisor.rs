//! End-to-end tests: mock SSE server through the bridge into a mock sink.

use std::sync::Arc;
use std::time::{Duration, Instant};
use wikibridge_core::RecordSink;
use wikibridge_runtime::{BridgeConfig, Supervisor};
use wikibridge_sse::{EventSource, ReconnectPolicy};
use wikibridge_testing::MockRecordSink;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream")
}

/// A reconnect delay far beyond any test's run duration, so a replayed
/// mock body cannot produce duplicate submissions.
fn one_shot_source(server: &MockServer) -> EventSource {
    EventSource::builder(format!("{}/stream", server.uri()))
        .user_agent("wikibridge-tests/1.0")
        .reconnect_policy(
            ReconnectPolicy::builder()
                .initial_delay(Duration::from_secs(120))
                .build(),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn two_events_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(sse_response("id: 1\ndata: A\n\nid: 2\ndata: B\n\n"))
        .mount(&server)
        .await;

    let sink = Arc::new(MockRecordSink::acknowledging());
    let config = BridgeConfig::default()
        .with_run_duration(Duration::from_millis(400))
        .with_drain_timeout(Duration::from_secs(2));

    Supervisor::new(config)
        .run_with(
            Arc::clone(&sink) as Arc<dyn RecordSink>,
            one_shot_source(&server),
        )
        .await
        .unwrap();

    let submissions = sink.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].0, "wikimedia.recentchange");
    assert_eq!(submissions[0].1.value, "A");
    assert_eq!(submissions[0].1.key, None);
    assert_eq!(submissions[1].1.value, "B");
    assert_eq!(submissions[1].1.key, None);
    assert_eq!(sink.flush_calls(), 1);
}

#[tokio::test]
async fn stream_error_does_not_end_the_run_early() {
    let server = MockServer::start().await;
    // One event, then the server starts failing; the client keeps
    // retrying while the run plays out.
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(sse_response("data: only\n\n"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = Arc::new(MockRecordSink::acknowledging());
    let config = BridgeConfig::default()
        .with_run_duration(Duration::from_millis(400))
        .with_drain_timeout(Duration::from_secs(2));

    let source = EventSource::builder(format!("{}/stream", server.uri()))
        .user_agent("wikibridge-tests/1.0")
        .reconnect_policy(
            ReconnectPolicy::builder()
                .initial_delay(Duration::from_millis(50))
                .multiplier(1.0)
                .build(),
        )
        .build()
        .unwrap();

    let started = Instant::now();
    Supervisor::new(config)
        .run_with(Arc::clone(&sink) as Arc<dyn RecordSink>, source)
        .await
        .unwrap();

    assert!(
        started.elapsed() >= Duration::from_millis(350),
        "run ended early"
    );
    assert_eq!(sink.values(), vec!["only"]);
}

#[tokio::test]
async fn shutdown_drains_in_flight_deliveries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(sse_response("data: A\n\ndata: B\n\n"))
        .mount(&server)
        .await;

    // Deliveries resolve well after the run duration, so both records are
    // still in flight when shutdown starts.
    let sink = Arc::new(MockRecordSink::delayed(Duration::from_millis(400)));
    let config = BridgeConfig::default()
        .with_run_duration(Duration::from_millis(150))
        .with_drain_timeout(Duration::from_secs(5));

    Supervisor::new(config)
        .run_with(
            Arc::clone(&sink) as Arc<dyn RecordSink>,
            one_shot_source(&server),
        )
        .await
        .unwrap();

    assert_eq!(sink.submission_count(), 2);
    assert_eq!(sink.flush_calls(), 1);
    assert_eq!(sink.in_flight(), 0, "shutdown returned with deliveries in flight");
}

#[tokio::test]
async fn drain_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(sse_response("data: A\n\n"))
        .mount(&server)
        .await;

    let sink = Arc::new(MockRecordSink::delayed(Duration::from_secs(60)));
    let config = BridgeConfig::default()
        .with_run_duration(Duration::from_millis(100))
        .with_drain_timeout(Duration::from_millis(100));

    let result = Supervisor::new(config)
        .run_with(
            Arc::clone(&sink) as Arc<dyn RecordSink>,
            one_shot_source(&server),
        )
        .await;

    assert!(result.is_err(), "flush timeout should surface");
}
