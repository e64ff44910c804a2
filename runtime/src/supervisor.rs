//! Process supervision: wiring, run gate, graceful shutdown.

use crate::bridge::ChangeBridge;
use crate::config::BridgeConfig;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use wikibridge_core::{RecordSink, SinkError, StreamError};
use wikibridge_kafka::KafkaRecordSink;
use wikibridge_sse::EventSource;

/// Errors that can abort a bridge run.
///
/// Only construction faults and a failed shutdown drain land here;
/// transient stream and delivery faults are handled inside the run and
/// never abort it.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The record sink failed to construct or to drain.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The stream client failed to construct.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Owns one bridge run from construction to drained shutdown.
///
/// The supervisor builds the sink and the stream client, starts the
/// stream, and then does exactly one more thing: decide when the run is
/// over. That happens when the configured duration elapses or on Ctrl-C,
/// whichever comes first. Shutdown is ordered: stop the source first so
/// no new events arrive, then flush the sink so in-flight records get
/// their delivery attempt.
pub struct Supervisor {
    config: BridgeConfig,
}

impl Supervisor {
    /// Create a supervisor for the given configuration.
    #[must_use]
    pub const fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Build the production sink and source, then run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if the sink or stream client cannot be
    /// constructed, or if the shutdown drain fails.
    pub async fn run(self) -> Result<(), RuntimeError> {
        let sink = KafkaRecordSink::builder()
            .brokers(&self.config.brokers)
            .build()?;
        let source = EventSource::builder(&self.config.source_url)
            .user_agent(&self.config.user_agent)
            .build()?;

        self.run_with(Arc::new(sink), source).await
    }

    /// Run the bridge over an explicit sink and source.
    ///
    /// Split out from [`run`](Supervisor::run) so tests can inject stub
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Sink`] if the shutdown drain fails.
    pub async fn run_with(
        &self,
        sink: Arc<dyn RecordSink>,
        source: EventSource,
    ) -> Result<(), RuntimeError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let bridge = ChangeBridge::new(Arc::clone(&sink), self.config.topic.clone());

        tracing::info!(
            url = %source.url(),
            topic = %self.config.topic,
            run_duration = ?self.config.run_duration,
            "Starting bridge"
        );
        let source_task = source.spawn(bridge, shutdown_rx);

        tokio::select! {
            () = tokio::time::sleep(self.config.run_duration) => {
                tracing::info!("Run duration elapsed, shutting down");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, shutting down");
            }
        }

        // Stop the source first: no new events may arrive once draining
        // starts.
        let _ = shutdown_tx.send(true);
        if let Err(error) = source_task.await {
            tracing::warn!(error = %error, "Stream task did not shut down cleanly");
        }

        tracing::info!(
            drain_timeout = ?self.config.drain_timeout,
            "Draining outstanding deliveries"
        );
        sink.flush(self.config.drain_timeout).await?;
        tracing::info!("Bridge shut down");
        Ok(())
    }
}
