//! Domain event sink trait and implementations.

use std::sync::{Arc, Mutex};

use log::error;
use tokio::sync::mpsc;

use super::DomainEvent;

/// Trait for receiving domain events.
///
/// Implementations translate domain events into platform-specific actions.
/// The scheduler emits events through this trait as polls complete.
///
/// # Design Rules
///
/// - `emit()` must be fast and non-blocking (no network calls, no DB writes)
/// - Implementations should queue events for async processing
/// - Failure to emit must not affect the poll that produced the event
///   (best-effort)
pub trait DomainEventSink: Send + Sync {
    /// Emit a single domain event.
    fn emit(&self, event: DomainEvent);

    /// Emit multiple domain events.
    ///
    /// Default implementation calls `emit()` for each event.
    /// Implementations may override for batch optimization.
    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// No-op implementation for tests or contexts that don't need events.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {
        // Intentionally empty - events are discarded
    }
}

/// Sink that forwards events to an mpsc channel.
///
/// Events are sent to an unbounded channel for processing by whatever the
/// host hangs off the receiver (a UI push loop, a websocket broadcaster).
/// This keeps `emit()` fast and non-blocking.
pub struct ChannelDomainEventSink {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

impl ChannelDomainEventSink {
    /// Creates a sink together with the receiving half of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DomainEventSink for ChannelDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        if let Err(e) = self.sender.send(event) {
            error!("Failed to send domain event to queue: {}", e);
        }
    }

    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            if let Err(e) = self.sender.send(event) {
                error!("Failed to send domain event to queue: {}", e);
                // Continue trying to send remaining events
            }
        }
    }
}

/// Mock sink for testing - collects emitted events.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Returns the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
