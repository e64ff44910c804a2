//! The event bridge: stream callbacks in, producer submissions out.

use async_trait::async_trait;
use std::sync::Arc;
use wikibridge_core::{
    ChangeEvent, ChangeRecord, DeliveryOutcome, RecordSink, StreamError, StreamHandler,
};

/// Adapts change stream notifications into record sink submissions.
///
/// The bridge holds exactly two things, both fixed for its lifetime: a
/// shared reference to the sink and the destination topic. It keeps no
/// other state, which is what makes its failure handling simple:
///
/// - Each event produces exactly one submission attempt, in receipt order.
/// - A failed delivery is logged and counted, never re-submitted. The
///   producer's own retry policy already ran its course; another layer of
///   retries here would duplicate records without bound.
/// - Stream errors are observed and logged; the stream client reconnects
///   on its own, and already-forwarded events are not re-sent.
pub struct ChangeBridge {
    sink: Arc<dyn RecordSink>,
    topic: String,
}

impl ChangeBridge {
    /// Create a bridge submitting to `topic` on the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn RecordSink>, topic: impl Into<String>) -> Self {
        Self {
            sink,
            topic: topic.into(),
        }
    }

    /// The destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl StreamHandler for ChangeBridge {
    async fn on_open(&self) {
        tracing::info!(topic = %self.topic, "Change stream open, forwarding to broker");
    }

    async fn on_message(&self, event: ChangeEvent) {
        metrics::counter!("bridge.events.received").increment(1);

        let ChangeEvent { id, payload } = event;
        let delivery = self.sink.submit(&self.topic, ChangeRecord::unkeyed(payload));
        metrics::counter!("bridge.records.submitted").increment(1);

        // Await the outcome off the stream task; the source must never
        // wait on broker I/O.
        let topic = self.topic.clone();
        tokio::spawn(async move {
            match delivery.await {
                DeliveryOutcome::Acknowledged { partition, offset } => {
                    metrics::counter!("bridge.deliveries.acknowledged").increment(1);
                    tracing::debug!(
                        topic = %topic,
                        partition,
                        offset,
                        event_id = id.as_deref(),
                        "Record delivered"
                    );
                }
                DeliveryOutcome::Failed { reason } => {
                    metrics::counter!("bridge.deliveries.failed").increment(1);
                    tracing::warn!(
                        topic = %topic,
                        event_id = id.as_deref(),
                        reason = %reason,
                        "Record dropped after producer retries"
                    );
                }
            }
        });
    }

    async fn on_comment(&self, comment: &str) {
        tracing::trace!(comment, "Keep-alive from source");
    }

    async fn on_error(&self, error: &StreamError) {
        metrics::counter!("bridge.stream.errors").increment(1);
        tracing::warn!(error = %error, "Stream error observed, client will reconnect");
    }

    async fn on_closed(&self) {
        tracing::info!("Change stream closed");
    }
}
