//! Per-build event sink
//!
//! The sink sits between event producers and the transport. It absorbs
//! lifecycle markers (the aggregator tracks its own session start and
//! finish) and forwards everything else as envelopes.
//!
//! # Lifecycle
//!
//! A sink is created Active and transitions to ShutDown exactly once.
//! Consuming on a shut-down sink is a caller bug and is surfaced as
//! [`HoistError::SinkShutDown`] rather than silently dropped.

use crate::error::{HoistError, HoistResult};
use crate::event::{BuildEvent, BuildId, Envelope, EventKind, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Forwards one logical build's events to a transport
///
/// Safe to share between producer threads; all methods take `&self`.
pub struct EventSink {
    /// Dropped on shutdown so no send can occur afterwards
    transport: RwLock<Option<Arc<dyn Transport>>>,

    started_forwarded: AtomicBool,
    finished_forwarded: AtomicBool,
}

impl EventSink {
    /// Create an active sink wrapping the given transport
    pub fn attach(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: RwLock::new(Some(transport)),
            started_forwarded: AtomicBool::new(false),
            finished_forwarded: AtomicBool::new(false),
        }
    }

    /// Consume one event on behalf of `build_id`
    ///
    /// Started and Finished markers are recorded locally and never
    /// forwarded; only their first occurrence flips the corresponding
    /// flag. All other kinds are wrapped and handed to the transport.
    pub fn consume(&self, event: BuildEvent, build_id: BuildId) -> HoistResult<()> {
        let transport = self
            .transport
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let transport = transport.as_ref().ok_or(HoistError::SinkShutDown)?;

        match event.kind {
            EventKind::Started => {
                // swap returns the previous value; only the first
                // occurrence transitions the flag
                if !self.started_forwarded.swap(true, Ordering::SeqCst) {
                    debug!("Build {} start observed", build_id);
                }
            }
            EventKind::Finished => {
                if !self.finished_forwarded.swap(true, Ordering::SeqCst) {
                    debug!("Build {} finish observed", build_id);
                }
            }
            _ => transport.send(Envelope::new(build_id, event)),
        }

        Ok(())
    }

    /// Shut the sink down
    ///
    /// Idempotent. Releases the transport reference so nothing can be
    /// sent even if `consume` is mistakenly invoked afterwards.
    pub fn shut_down(&self) {
        let mut transport = self
            .transport
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if transport.take().is_some() {
            debug!("Event sink shut down");
        }
    }

    /// Whether the sink has been shut down
    pub fn is_shut_down(&self) -> bool {
        self.transport
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    /// Whether a Started marker has been observed
    pub fn started_seen(&self) -> bool {
        self.started_forwarded.load(Ordering::SeqCst)
    }

    /// Whether a Finished marker has been observed
    pub fn finished_seen(&self) -> bool {
        self.finished_forwarded.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Transport that records everything it was asked to send
    struct RecordingTransport {
        sent: Mutex<Vec<Envelope>>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<Envelope> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, envelope: Envelope) {
            self.sent.lock().unwrap().push(envelope);
        }
    }

    #[test]
    fn lifecycle_markers_are_absorbed() {
        let transport = RecordingTransport::new();
        let sink = EventSink::attach(transport.clone());
        let id = BuildId::new();

        sink.consume(BuildEvent::started(), id).unwrap();
        sink.consume(BuildEvent::started(), id).unwrap();
        sink.consume(BuildEvent::finished(), id).unwrap();
        sink.consume(BuildEvent::finished(), id).unwrap();

        assert!(transport.sent().is_empty());
        assert!(sink.started_seen());
        assert!(sink.finished_seen());
    }

    #[test]
    fn non_lifecycle_events_are_forwarded_in_order() {
        let transport = RecordingTransport::new();
        let sink = EventSink::attach(transport.clone());
        let id = BuildId::new();

        sink.consume(BuildEvent::message("one"), id).unwrap();
        sink.consume(BuildEvent::started(), id).unwrap();
        sink.consume(BuildEvent::error("two"), id).unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].event.payload["text"], "one");
        assert_eq!(sent[1].event.kind, EventKind::Error);
        assert_eq!(sent[0].build_id, id);
    }

    #[test]
    fn consume_after_shutdown_is_an_error() {
        let transport = RecordingTransport::new();
        let sink = EventSink::attach(transport.clone());
        let id = BuildId::new();

        sink.shut_down();
        sink.shut_down(); // idempotent

        let err = sink.consume(BuildEvent::message("late"), id).unwrap_err();
        assert!(matches!(err, HoistError::SinkShutDown));
        assert!(err.is_protocol_misuse());
        assert!(transport.sent().is_empty());
        assert!(sink.is_shut_down());
    }

    #[test]
    fn concurrent_starts_flip_flag_once() {
        let transport = RecordingTransport::new();
        let sink = Arc::new(EventSink::attach(transport.clone()));
        let id = BuildId::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = sink.clone();
                std::thread::spawn(move || sink.consume(BuildEvent::started(), id))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert!(sink.started_seen());
        assert!(transport.sent().is_empty());
    }
}
