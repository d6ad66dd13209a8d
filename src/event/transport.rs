//! Transport abstraction for forwarding envelopes
//!
//! The transport stands in for cross-process message dispatch to the
//! aggregator. `send` is infallible by contract: a transport that hits
//! an IO problem logs it and drops the envelope rather than failing the
//! build that produced the event.

use crate::event::Envelope;
use std::io::Write;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// Abstract envelope transport
///
/// Implementations must be safe to call from multiple producer threads;
/// submission order from a single thread is preserved.
pub trait Transport: Send + Sync {
    /// Hand an envelope to the aggregator. Must not fail.
    fn send(&self, envelope: Envelope);
}

/// In-process transport over an unbounded channel
///
/// Used when the aggregator lives in the same process (tests, the CLI's
/// console drain). A dropped receiver is logged and otherwise ignored.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ChannelTransport {
    /// Create a transport plus the receiving end for the aggregator
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, envelope: Envelope) {
        if self.tx.send(envelope).is_err() {
            warn!("Event receiver dropped; envelope discarded");
        }
    }
}

/// Transport that writes one JSON object per line
///
/// The wire form used when forwarding to another process over a pipe
/// or into an event log file.
pub struct JsonLinesTransport {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesTransport {
    /// Wrap any writer as a JSON-lines transport
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Transport for JsonLinesTransport {
    fn send(&self, envelope: Envelope) {
        let mut line = match serde_json::to_string(&envelope) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize envelope: {}", e);
                return;
            }
        };
        line.push('\n');

        // Mutex poisoning only happens if a previous sender panicked
        // mid-write; recover the writer and keep forwarding.
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|()| writer.flush()) {
            warn!("Failed to write envelope: {}", e);
        }
    }
}
