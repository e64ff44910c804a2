//! Integration tests for the stream client against a mock SSE server.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use wikibridge_core::{ChangeEvent, StreamError, StreamHandler};
use wikibridge_sse::{EventSource, ReconnectPolicy};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records every callback in arrival order.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
}

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl StreamHandler for Recorder {
    async fn on_open(&self) {
        self.record("open".to_string());
    }

    async fn on_message(&self, event: ChangeEvent) {
        self.record(format!("message:{}", event.payload));
    }

    async fn on_comment(&self, comment: &str) {
        self.record(format!("comment:{comment}"));
    }

    async fn on_error(&self, error: &StreamError) {
        self.record(format!("error:{error}"));
    }

    async fn on_closed(&self) {
        self.record("closed".to_string());
    }
}

/// A handler that shares its recorder so tests can observe a moved handler.
struct SharedRecorder(std::sync::Arc<Recorder>);

#[async_trait]
impl StreamHandler for SharedRecorder {
    async fn on_open(&self) {
        self.0.on_open().await;
    }
    async fn on_message(&self, event: ChangeEvent) {
        self.0.on_message(event).await;
    }
    async fn on_comment(&self, comment: &str) {
        self.0.on_comment(comment).await;
    }
    async fn on_error(&self, error: &StreamError) {
        self.0.on_error(error).await;
    }
    async fn on_closed(&self) {
        self.0.on_closed().await;
    }
}

fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream")
}

fn slow_reconnect() -> ReconnectPolicy {
    ReconnectPolicy::builder()
        .initial_delay(Duration::from_secs(60))
        .build()
}

fn fast_reconnect() -> ReconnectPolicy {
    ReconnectPolicy::builder()
        .initial_delay(Duration::from_millis(20))
        .multiplier(1.0)
        .build()
}

async fn wait_until(recorder: &Recorder, predicate: impl Fn(&[String]) -> bool) {
    for _ in 0..200 {
        if predicate(&recorder.calls()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn delivers_callbacks_in_receipt_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(sse_response(": hi\ndata: A\n\ndata: B\n\n"))
        .mount(&server)
        .await;

    let recorder = std::sync::Arc::new(Recorder::default());
    let source = EventSource::builder(format!("{}/stream", server.uri()))
        .user_agent("wikibridge-tests/1.0")
        .reconnect_policy(slow_reconnect())
        .build()
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = source.spawn(SharedRecorder(recorder.clone()), shutdown_rx);

    wait_until(&recorder, |calls| calls.contains(&"closed".to_string())).await;
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    let calls = recorder.calls();
    assert_eq!(
        &calls[..5],
        &[
            "open".to_string(),
            "comment:hi".to_string(),
            "message:A".to_string(),
            "message:B".to_string(),
            "closed".to_string(),
        ]
    );
}

#[tokio::test]
async fn sends_configured_user_agent() {
    let server = MockServer::start().await;
    // The mock only matches when the User-Agent header is present, so a
    // missing header surfaces as a 404 and no message ever arrives.
    Mock::given(method("GET"))
        .and(path("/stream"))
        .and(header("user-agent", "agent-under-test/2.0"))
        .respond_with(sse_response("data: seen\n\n"))
        .mount(&server)
        .await;

    let recorder = std::sync::Arc::new(Recorder::default());
    let source = EventSource::builder(format!("{}/stream", server.uri()))
        .user_agent("agent-under-test/2.0")
        .reconnect_policy(slow_reconnect())
        .build()
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = source.spawn(SharedRecorder(recorder.clone()), shutdown_rx);

    wait_until(&recorder, |calls| {
        calls.contains(&"message:seen".to_string())
    })
    .await;
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    assert!(recorder.calls().contains(&"message:seen".to_string()));
}

#[tokio::test]
async fn resumes_with_last_event_id_after_server_close() {
    let server = MockServer::start().await;
    // First connection: one identified event, then the body ends.
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(sse_response("id: 7\ndata: first\n\n"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Reconnect must carry the id of the last event it saw.
    Mock::given(method("GET"))
        .and(path("/stream"))
        .and(header("Last-Event-ID", "7"))
        .respond_with(sse_response("data: second\n\n"))
        .mount(&server)
        .await;

    let recorder = std::sync::Arc::new(Recorder::default());
    let source = EventSource::builder(format!("{}/stream", server.uri()))
        .user_agent("wikibridge-tests/1.0")
        .reconnect_policy(fast_reconnect())
        .build()
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = source.spawn(SharedRecorder(recorder.clone()), shutdown_rx);

    wait_until(&recorder, |calls| {
        calls.contains(&"message:second".to_string())
    })
    .await;
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    let calls = recorder.calls();
    assert!(calls.contains(&"message:first".to_string()));
    assert!(calls.contains(&"message:second".to_string()));
}

#[tokio::test]
async fn http_error_is_reported_and_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(sse_response("data: recovered\n\n"))
        .mount(&server)
        .await;

    let recorder = std::sync::Arc::new(Recorder::default());
    let source = EventSource::builder(format!("{}/stream", server.uri()))
        .user_agent("wikibridge-tests/1.0")
        .reconnect_policy(fast_reconnect())
        .build()
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = source.spawn(SharedRecorder(recorder.clone()), shutdown_rx);

    wait_until(&recorder, |calls| {
        calls.contains(&"message:recovered".to_string())
    })
    .await;
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    let calls = recorder.calls();
    let error_position = calls.iter().position(|c| c.starts_with("error:"));
    let message_position = calls.iter().position(|c| c == "message:recovered");
    assert!(error_position.is_some(), "expected an error callback: {calls:?}");
    assert!(
        error_position < message_position,
        "error should precede the recovered message: {calls:?}"
    );
}

#[tokio::test]
async fn shutdown_during_backoff_stops_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let recorder = std::sync::Arc::new(Recorder::default());
    let source = EventSource::builder(format!("{}/stream", server.uri()))
        .user_agent("wikibridge-tests/1.0")
        .reconnect_policy(slow_reconnect())
        .build()
        .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = source.spawn(SharedRecorder(recorder.clone()), shutdown_rx);

    wait_until(&recorder, |calls| {
        calls.iter().any(|c| c.starts_with("error:"))
    })
    .await;
    shutdown_tx.send(true).unwrap();

    // The loop must exit promptly instead of sleeping out the backoff.
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("stream task should stop on shutdown")
        .unwrap();

    assert!(!recorder.calls().iter().any(|c| c.starts_with("message:")));
}
