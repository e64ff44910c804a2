//! Kafka implementation of the [`RecordSink`] trait.
//!
//! This crate wraps rdkafka's `FutureProducer` so the bridge can hand
//! records to Kafka without ever blocking the stream task: `submit`
//! enqueues into the producer's local buffer and returns a future that
//! resolves when the broker acknowledges (or the producer gives up on)
//! the record.
//!
//! # Delivery Semantics
//!
//! **At-least-once** up to the producer's configured retry limit:
//! - The producer retries failed sends internally with its own backoff
//! - A record whose retries are exhausted resolves as
//!   [`DeliveryOutcome::Failed`] and is dropped by the caller
//! - Ordering is preserved per partition while retries are enabled and
//!   pipelining stays within the producer's in-flight bound
//!
//! Acknowledgment and retry behaviour are deliberately configuration, not
//! code: the builder exposes `acks`, `retries` and `message_timeout` and
//! leaves rdkafka's defaults in place when unset.
//!
//! # Example
//!
//! ```no_run
//! use wikibridge_core::{ChangeRecord, RecordSink};
//! use wikibridge_kafka::KafkaRecordSink;
//!
//! # async fn example() -> Result<(), wikibridge_core::SinkError> {
//! let sink = KafkaRecordSink::builder()
//!     .brokers("127.0.0.1:9092")
//!     .acks("all")
//!     .build()?;
//!
//! let outcome = sink
//!     .submit("wikimedia.recentchange", ChangeRecord::unkeyed("{...}"))
//!     .await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use wikibridge_core::{ChangeRecord, DeliveryFuture, DeliveryOutcome, RecordSink, SinkError};

/// Kafka-backed record sink.
///
/// Holds a single `FutureProducer`; safe to share across tasks by
/// reference. Construction validates the configuration and is the only
/// fatal failure point; everything after that resolves through
/// [`DeliveryOutcome`].
pub struct KafkaRecordSink {
    /// Kafka producer used for all submissions.
    producer: FutureProducer,
    /// Broker addresses, kept for logging.
    brokers: String,
}

impl KafkaRecordSink {
    /// Create a new builder for configuring the sink.
    #[must_use]
    pub fn builder() -> KafkaRecordSinkBuilder {
        KafkaRecordSinkBuilder::default()
    }

    /// Get a reference to the brokers string.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }
}

impl RecordSink for KafkaRecordSink {
    fn submit(&self, topic: &str, record: ChangeRecord) -> DeliveryFuture {
        // send_result copies the record into librdkafka's buffer and
        // returns immediately; only the returned future waits on the broker.
        let enqueued = match record.key.as_deref() {
            Some(key) => self
                .producer
                .send_result(
                    FutureRecord::to(topic)
                        .payload(record.value.as_str())
                        .key(key),
                )
                .map_err(|(err, _)| err),
            None => self
                .producer
                .send_result(FutureRecord::<(), _>::to(topic).payload(record.value.as_str()))
                .map_err(|(err, _)| err),
        };

        match enqueued {
            Ok(delivery) => {
                let topic = topic.to_string();
                Box::pin(async move {
                    match delivery.await {
                        Ok(Ok((partition, offset))) => {
                            tracing::trace!(
                                topic = %topic,
                                partition,
                                offset,
                                "Record delivered"
                            );
                            DeliveryOutcome::Acknowledged { partition, offset }
                        }
                        Ok(Err((err, _record))) => {
                            tracing::debug!(topic = %topic, error = %err, "Record delivery failed");
                            DeliveryOutcome::Failed {
                                reason: err.to_string(),
                            }
                        }
                        Err(_) => DeliveryOutcome::Failed {
                            reason: "delivery result dropped by producer".to_string(),
                        },
                    }
                })
            }
            Err(err) => {
                tracing::warn!(topic = %topic, error = %err, "Failed to enqueue record");
                let outcome = DeliveryOutcome::Failed {
                    reason: err.to_string(),
                };
                Box::pin(async move { outcome })
            }
        }
    }

    fn flush(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
        Box::pin(async move {
            self.producer
                .flush(Timeout::After(timeout))
                .map_err(|e| SinkError::FlushFailed(e.to_string()))
        })
    }
}

/// Builder for configuring a [`KafkaRecordSink`].
///
/// # Example
///
/// ```no_run
/// use wikibridge_kafka::KafkaRecordSink;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), wikibridge_core::SinkError> {
/// let sink = KafkaRecordSink::builder()
///     .brokers("127.0.0.1:9092,127.0.0.1:9093")
///     .acks("all")
///     .compression("lz4")
///     .retries(10)
///     .message_timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct KafkaRecordSinkBuilder {
    brokers: Option<String>,
    acks: Option<String>,
    compression: Option<String>,
    retries: Option<u32>,
    message_timeout: Option<Duration>,
}

impl KafkaRecordSinkBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the acknowledgment mode: "0", "1" or "all".
    ///
    /// Default: "1"
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Set the compression codec: "none", "gzip", "snappy", "lz4", "zstd".
    ///
    /// Default: "none"
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the per-record retry count. When unset, the producer's default
    /// (effectively unlimited, bounded by the message timeout) applies.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Set the message delivery timeout. Retries stop and the delivery
    /// resolves as failed once a record has been in the producer for this
    /// long.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = Some(timeout);
        self
    }

    /// Build the [`KafkaRecordSink`].
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::ConnectionFailed`] if brokers are not set or
    /// the producer cannot be created from the configuration.
    pub fn build(self) -> Result<KafkaRecordSink, SinkError> {
        let brokers = self
            .brokers
            .ok_or_else(|| SinkError::ConnectionFailed("Brokers not configured".to_string()))?;

        let message_timeout = self.message_timeout.unwrap_or(Duration::from_secs(5));

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &brokers)
            .set(
                "message.timeout.ms",
                message_timeout.as_millis().to_string(),
            )
            .set("acks", self.acks.as_deref().unwrap_or("1"))
            .set(
                "compression.type",
                self.compression.as_deref().unwrap_or("none"),
            );
        if let Some(retries) = self.retries {
            config.set("retries", retries.to_string());
        }

        let producer: FutureProducer = config.create().map_err(|e| {
            SinkError::ConnectionFailed(format!("Failed to create producer: {e}"))
        })?;

        tracing::info!(
            brokers = %brokers,
            acks = self.acks.as_deref().unwrap_or("1"),
            compression = self.compression.as_deref().unwrap_or("none"),
            message_timeout_ms = message_timeout.as_millis() as u64,
            "KafkaRecordSink created"
        );

        Ok(KafkaRecordSink { producer, brokers })
    }
}
