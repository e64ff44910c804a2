//! # Wikibridge Testing
//!
//! Testing utilities for the change stream bridge.
//!
//! The main tool is [`MockRecordSink`], an in-memory [`RecordSink`] that
//! captures every submission in order and resolves deliveries according to
//! a configurable [`SinkMode`]: acknowledge immediately, fail, resolve
//! after a delay, or stay pending until released. The pending and delayed
//! modes exist so tests can exercise the non-blocking submission contract
//! and the shutdown drain path without a broker and without real brokers'
//! timing.
//!
//! [`RecordSink`]: wikibridge_core::RecordSink

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Mock implementations of the core traits.
pub mod mocks {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::Instant;
    use wikibridge_core::{ChangeRecord, DeliveryFuture, DeliveryOutcome, RecordSink, SinkError};

    /// How a [`MockRecordSink`] resolves delivery futures.
    #[derive(Debug, Clone)]
    pub enum SinkMode {
        /// Acknowledge immediately with partition 0 and increasing offsets.
        Acknowledge,
        /// Fail immediately with the given reason.
        Fail(String),
        /// Acknowledge after the given delay.
        Delay(Duration),
        /// Stay pending until [`MockRecordSink::release`] or `flush` runs.
        Pending,
    }

    /// In-memory record sink that captures submissions in receipt order.
    pub struct MockRecordSink {
        mode: SinkMode,
        submissions: Mutex<Vec<(String, ChangeRecord)>>,
        next_offset: AtomicI64,
        in_flight: Arc<AtomicUsize>,
        flush_calls: AtomicUsize,
        release_tx: watch::Sender<bool>,
        release_rx: watch::Receiver<bool>,
    }

    impl MockRecordSink {
        /// Create a sink with the given delivery mode.
        #[must_use]
        pub fn new(mode: SinkMode) -> Self {
            let (release_tx, release_rx) = watch::channel(false);
            Self {
                mode,
                submissions: Mutex::new(Vec::new()),
                next_offset: AtomicI64::new(0),
                in_flight: Arc::new(AtomicUsize::new(0)),
                flush_calls: AtomicUsize::new(0),
                release_tx,
                release_rx,
            }
        }

        /// A sink that acknowledges everything immediately.
        #[must_use]
        pub fn acknowledging() -> Self {
            Self::new(SinkMode::Acknowledge)
        }

        /// A sink that fails every delivery with `reason`.
        #[must_use]
        pub fn failing(reason: impl Into<String>) -> Self {
            Self::new(SinkMode::Fail(reason.into()))
        }

        /// A sink that acknowledges after `delay`.
        #[must_use]
        pub fn delayed(delay: Duration) -> Self {
            Self::new(SinkMode::Delay(delay))
        }

        /// A sink whose deliveries stay pending until released.
        #[must_use]
        pub fn pending() -> Self {
            Self::new(SinkMode::Pending)
        }

        /// Every submission so far, in receipt order.
        #[must_use]
        pub fn submissions(&self) -> Vec<(String, ChangeRecord)> {
            self.submissions
                .lock()
                .map(|subs| subs.clone())
                .unwrap_or_default()
        }

        /// The record values submitted so far, in receipt order.
        #[must_use]
        pub fn values(&self) -> Vec<String> {
            self.submissions()
                .into_iter()
                .map(|(_, record)| record.value)
                .collect()
        }

        /// Number of submissions so far.
        #[must_use]
        pub fn submission_count(&self) -> usize {
            self.submissions.lock().map(|subs| subs.len()).unwrap_or(0)
        }

        /// Number of deliveries not yet resolved.
        #[must_use]
        pub fn in_flight(&self) -> usize {
            self.in_flight.load(Ordering::SeqCst)
        }

        /// Number of times `flush` was called.
        #[must_use]
        pub fn flush_calls(&self) -> usize {
            self.flush_calls.load(Ordering::SeqCst)
        }

        /// Release all pending deliveries (mode [`SinkMode::Pending`]).
        pub fn release(&self) {
            let _ = self.release_tx.send(true);
        }
    }

    impl RecordSink for MockRecordSink {
        fn submit(&self, topic: &str, record: ChangeRecord) -> DeliveryFuture {
            if let Ok(mut submissions) = self.submissions.lock() {
                submissions.push((topic.to_string(), record));
            }

            let in_flight = Arc::clone(&self.in_flight);
            in_flight.fetch_add(1, Ordering::SeqCst);
            let offset = self.next_offset.fetch_add(1, Ordering::SeqCst);

            match &self.mode {
                SinkMode::Acknowledge => Box::pin(async move {
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    DeliveryOutcome::Acknowledged {
                        partition: 0,
                        offset,
                    }
                }),
                SinkMode::Fail(reason) => {
                    let reason = reason.clone();
                    Box::pin(async move {
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        DeliveryOutcome::Failed { reason }
                    })
                }
                SinkMode::Delay(delay) => {
                    let delay = *delay;
                    Box::pin(async move {
                        tokio::time::sleep(delay).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        DeliveryOutcome::Acknowledged {
                            partition: 0,
                            offset,
                        }
                    })
                }
                SinkMode::Pending => {
                    let mut released = self.release_rx.clone();
                    Box::pin(async move {
                        while !*released.borrow() {
                            if released.changed().await.is_err() {
                                break;
                            }
                        }
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        DeliveryOutcome::Acknowledged {
                            partition: 0,
                            offset,
                        }
                    })
                }
            }
        }

        fn flush(
            &self,
            timeout: Duration,
        ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
            Box::pin(async move {
                self.flush_calls.fetch_add(1, Ordering::SeqCst);
                self.release();

                let deadline = Instant::now() + timeout;
                while self.in_flight.load(Ordering::SeqCst) > 0 {
                    if Instant::now() >= deadline {
                        return Err(SinkError::FlushTimeout { timeout });
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Ok(())
            })
        }
    }
}

pub use mocks::{MockRecordSink, SinkMode};
