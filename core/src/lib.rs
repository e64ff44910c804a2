//! # Wikibridge Core
//!
//! Data model and contracts shared by every component of the Wikimedia
//! change stream bridge.
//!
//! This crate defines:
//! - The wire-facing data types: [`ChangeEvent`] (what arrives from the
//!   stream) and [`ChangeRecord`] (what is handed to the broker producer)
//! - The [`RecordSink`] trait implemented by broker producers
//! - The [`StreamHandler`] trait implemented by stream consumers
//! - The shared error types [`StreamError`] and [`SinkError`]
//!
//! No I/O happens here; implementations live in the `wikibridge-sse` and
//! `wikibridge-kafka` crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod handler;
pub mod sink;

pub use error::{SinkError, StreamError};
pub use event::{ChangeEvent, ChangeRecord};
pub use handler::StreamHandler;
pub use sink::{DeliveryFuture, DeliveryOutcome, RecordSink};
