//! Build event model and per-build event forwarding
//!
//! Events produced while executing targets are wrapped in envelopes
//! and forwarded to a remote aggregator through an abstract transport.
//! Each logical build owns exactly one sink.

pub mod sink;
pub mod transport;

pub use sink::EventSink;
pub use transport::{ChannelTransport, JsonLinesTransport, Transport};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of a build event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Started,
    Finished,
    Message,
    Warning,
    Error,
    Custom,
}

/// Handle identifying one logical build
///
/// Stable for the lifetime of the build; every envelope produced on
/// behalf of that build carries the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildId(Uuid);

impl BuildId {
    /// Allocate a fresh build id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One diagnostic or progress event, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildEvent {
    /// What kind of event this is
    pub kind: EventKind,

    /// When the event was created
    pub timestamp: DateTime<Utc>,

    /// Free-form payload; shape depends on the kind
    pub payload: serde_json::Value,
}

impl BuildEvent {
    /// Create an event of the given kind with an arbitrary payload
    pub fn new(kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Lifecycle marker: the logical build has started
    pub fn started() -> Self {
        Self::new(EventKind::Started, serde_json::Value::Null)
    }

    /// Lifecycle marker: the logical build has finished
    pub fn finished() -> Self {
        Self::new(EventKind::Finished, serde_json::Value::Null)
    }

    /// Informational message event
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(EventKind::Message, serde_json::json!({ "text": text.into() }))
    }

    /// Warning event
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(EventKind::Warning, serde_json::json!({ "text": text.into() }))
    }

    /// Error event
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(EventKind::Error, serde_json::json!({ "text": text.into() }))
    }
}

/// The unit handed to a transport: one event plus its build id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Which logical build the event belongs to
    pub build_id: BuildId,

    /// The wrapped event
    pub event: BuildEvent,
}

impl Envelope {
    /// Wrap an event for transport
    pub fn new(build_id: BuildId, event: BuildEvent) -> Self {
        Self { build_id, event }
    }
}
