//! Record sink abstraction for broker producers.
//!
//! A [`RecordSink`] accepts a record for a named topic, buffers it, and
//! delivers it asynchronously. Submission is split in two: `submit`
//! enqueues synchronously and returns a future that resolves once the
//! delivery attempt does. The caller decides whether to await the outcome,
//! so a slow broker never stalls the thread that receives events.
//!
//! # Delivery Semantics
//!
//! At-least-once up to the producer's own retry limit. Once the producer
//! exhausts its retries, the outcome resolves as [`DeliveryOutcome::Failed`]
//! and the record is dropped; callers observe the failure but do not
//! re-submit, because re-submission on top of producer retries would
//! duplicate records without bound.
//!
//! # Dyn Compatibility
//!
//! The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so that sinks can be shared as `Arc<dyn RecordSink>` across
//! handler invocations.

use crate::error::SinkError;
use crate::event::ChangeRecord;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Result of a single record delivery attempt.
///
/// Ephemeral: observed, logged, counted, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The broker accepted the record.
    Acknowledged {
        /// Partition the record landed on.
        partition: i32,
        /// Offset assigned within the partition.
        offset: i64,
    },
    /// Delivery failed after the producer's internal retries.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

/// Future resolving to the outcome of one delivery attempt.
pub type DeliveryFuture = Pin<Box<dyn Future<Output = DeliveryOutcome> + Send>>;

/// Trait for asynchronous record producers.
///
/// Implementations must be `Send + Sync`: a single sink instance is shared
/// by reference across all handler invocations and must tolerate concurrent
/// submission.
pub trait RecordSink: Send + Sync {
    /// Enqueue a record for delivery to `topic`.
    ///
    /// Enqueueing never blocks on broker I/O. A failure to enqueue (for
    /// example a full local queue) resolves the returned future immediately
    /// with [`DeliveryOutcome::Failed`] rather than panicking or blocking.
    fn submit(&self, topic: &str, record: ChangeRecord) -> DeliveryFuture;

    /// Drive all outstanding deliveries to resolution.
    ///
    /// Used on shutdown so in-flight records get their delivery attempt
    /// before the process releases the producer.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::FlushTimeout`] if outstanding deliveries do not
    /// resolve within `timeout`, or [`SinkError::FlushFailed`] if the
    /// underlying producer reports a flush failure.
    fn flush(
        &self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_compare_by_placement() {
        let a = DeliveryOutcome::Acknowledged {
            partition: 0,
            offset: 7,
        };
        let b = DeliveryOutcome::Acknowledged {
            partition: 0,
            offset: 7,
        };
        assert_eq!(a, b);
    }
}
