//! Shared error types for the stream and sink boundaries.

use std::time::Duration;
use thiserror::Error;

/// Errors reported by the event stream client.
///
/// Apart from [`StreamError::Configuration`], every variant is a transient
/// fault: the client recovers by reconnecting with backoff, and handlers
/// only observe the error through [`StreamHandler::on_error`].
///
/// [`StreamHandler::on_error`]: crate::handler::StreamHandler::on_error
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// Invalid client configuration (malformed URL, bad header value).
    /// Fatal: surfaces at construction time, before any event flows.
    #[error("Invalid stream configuration: {0}")]
    Configuration(String),

    /// The connection attempt failed before a response arrived.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The source answered with a non-success HTTP status.
    #[error("Source returned HTTP status {status}")]
    Http {
        /// HTTP status code of the response.
        status: u16,
    },

    /// The connection dropped while reading the stream body.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors reported by a record sink.
///
/// Per-record delivery faults are not errors: they resolve through
/// [`DeliveryOutcome::Failed`] so that a single bad record never tears
/// down the sink.
///
/// [`DeliveryOutcome::Failed`]: crate::sink::DeliveryOutcome::Failed
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    /// The sink could not be constructed or could not reach the broker.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Outstanding deliveries did not resolve within the flush timeout.
    #[error("Flush did not complete within {timeout:?}")]
    FlushTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The flush operation itself failed.
    #[error("Flush failed: {0}")]
    FlushFailed(String),
}
