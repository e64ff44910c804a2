//! Callback surface invoked by the event stream client.
//!
//! The stream client drives all callbacks sequentially from a single task,
//! so implementations never see two callbacks running concurrently for the
//! same source. `on_message` is the hot path and must return promptly: it
//! may enqueue work but must not await broker acknowledgment.

use crate::error::StreamError;
use crate::event::ChangeEvent;
use async_trait::async_trait;

/// Handler for event stream lifecycle and message callbacks.
///
/// Only [`on_message`](StreamHandler::on_message) is required; the
/// lifecycle callbacks default to no-ops for handlers that only care about
/// payloads.
#[async_trait]
pub trait StreamHandler: Send + Sync {
    /// The connection was established (or re-established).
    async fn on_open(&self) {}

    /// A change event arrived.
    ///
    /// Invoked once per event, in receipt order. Must not block on
    /// downstream I/O.
    async fn on_message(&self, event: ChangeEvent);

    /// A comment (keep-alive) frame arrived.
    async fn on_comment(&self, _comment: &str) {}

    /// The connection failed. The client reconnects on its own; handlers
    /// observe the fault, they do not recover from it.
    async fn on_error(&self, _error: &StreamError) {}

    /// The stream ended, either because the server closed it or because
    /// the client was told to shut down.
    async fn on_closed(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        payloads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StreamHandler for Recorder {
        async fn on_message(&self, event: ChangeEvent) {
            if let Ok(mut payloads) = self.payloads.lock() {
                payloads.push(event.payload);
            }
        }
    }

    #[tokio::test]
    async fn default_lifecycle_callbacks_are_no_ops() {
        let recorder = Recorder {
            payloads: Mutex::new(Vec::new()),
        };
        recorder.on_open().await;
        recorder.on_comment("keep-alive").await;
        recorder
            .on_error(&StreamError::Transport("reset".to_string()))
            .await;
        recorder.on_closed().await;
        recorder
            .on_message(ChangeEvent::new(None, "only this counts"))
            .await;

        let payloads = recorder.payloads.lock().map(|p| p.clone()).ok();
        assert_eq!(payloads, Some(vec!["only this counts".to_string()]));
    }
}
