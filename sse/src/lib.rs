//! # Wikibridge SSE
//!
//! Server-sent-events client for the change stream bridge.
//!
//! [`EventSource`] owns the full connection lifecycle: it opens a streaming
//! HTTP request, decodes the SSE wire framing into discrete frames, invokes
//! a [`StreamHandler`] for each one, and reconnects with exponential backoff
//! when the connection drops. Handlers never deal with transport concerns;
//! they see a clean sequence of `on_open` / `on_message` / `on_comment` /
//! `on_error` / `on_closed` callbacks driven from a single task.
//!
//! # Example
//!
//! ```no_run
//! use wikibridge_sse::EventSource;
//! use tokio::sync::watch;
//! # use wikibridge_core::{ChangeEvent, StreamHandler};
//! # use async_trait::async_trait;
//! # struct Printer;
//! # #[async_trait]
//! # impl StreamHandler for Printer {
//! #     async fn on_message(&self, event: ChangeEvent) { println!("{}", event.payload); }
//! # }
//!
//! # async fn example() -> Result<(), wikibridge_core::StreamError> {
//! let source = EventSource::builder("https://stream.wikimedia.org/v2/stream/recentchange")
//!     .user_agent("WikimediaKafkaProducer/1.0")
//!     .build()?;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let task = source.spawn(Printer, shutdown_rx);
//!
//! // ... later
//! shutdown_tx.send(true).ok();
//! task.await.ok();
//! # Ok(())
//! # }
//! ```
//!
//! [`StreamHandler`]: wikibridge_core::StreamHandler

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod decode;
pub mod reconnect;

pub use client::{EventSource, EventSourceBuilder};
pub use decode::{SseDecoder, SseFrame};
pub use reconnect::ReconnectPolicy;
