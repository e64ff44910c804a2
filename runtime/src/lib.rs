//! # Wikibridge Runtime
//!
//! The event bridge and the process supervisor.
//!
//! [`ChangeBridge`] is the piece that actually moves data: it implements
//! the stream callback surface and turns every change event into one
//! producer submission. [`Supervisor`] wires the stream client and the
//! Kafka sink together from a [`BridgeConfig`], bounds the run duration,
//! and drains outstanding deliveries on the way out.
//!
//! ```text
//! ┌──────────────┐  on_message   ┌──────────────┐  submit   ┌────────┐
//! │ EventSource  │ ────────────► │ ChangeBridge │ ────────► │  Sink  │
//! │ (sse client) │               │   (handler)  │           │ (kafka)│
//! └──────────────┘               └──────────────┘           └────────┘
//!         ▲                                                      │
//!         │         Supervisor: run gate, shutdown, drain        │
//!         └──────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod config;
pub mod supervisor;

pub use bridge::ChangeBridge;
pub use config::BridgeConfig;
pub use supervisor::{RuntimeError, Supervisor};
