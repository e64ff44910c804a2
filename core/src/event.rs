//! Event and record types flowing through the bridge.
//!
//! A [`ChangeEvent`] is what the stream client hands to the bridge; a
//! [`ChangeRecord`] is what the bridge hands to the producer. Payloads are
//! opaque text end to end: the bridge never parses them, so upstream schema
//! changes cannot break ingestion.

use serde::{Deserialize, Serialize};

/// A single change notification received from the event stream.
///
/// The payload is forwarded verbatim to the broker. The identifier comes
/// from the stream's `id:` field and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Event identifier assigned by the source, if any.
    pub id: Option<String>,
    /// Opaque textual payload.
    pub payload: String,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(id: Option<String>, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

/// A key/value record submitted to a broker topic.
///
/// Records produced by the bridge are unkeyed: change events carry no
/// ordering relationship to each other, so partition placement is left to
/// the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Partitioning key; `None` for unordered ingestion.
    pub key: Option<String>,
    /// Record value, raw text.
    pub value: String,
}

impl ChangeRecord {
    /// Create a record with an explicit key.
    pub fn keyed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }

    /// Create an unkeyed record.
    pub fn unkeyed(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: value.into(),
        }
    }
}
