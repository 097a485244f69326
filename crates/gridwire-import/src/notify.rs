//! Change notifications published after registration.

use std::fmt;

use tracing::info;

use gridwire_ir::{CircuitId, TypeId};

/// Something other parts of the application may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A circuit was materialized.
    CircuitRegistered(CircuitId),
    /// A component-type schema was created or changed.
    SchemaUpdated(TypeId),
}

impl Event {
    /// Event tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Event::CircuitRegistered(_) => "circuitRegistered",
            Event::SchemaUpdated(_) => "schemaUpdated",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CircuitRegistered(c) => write!(f, "{} {c}", self.tag()),
            Event::SchemaUpdated(t) => write!(f, "{} {t}", self.tag()),
        }
    }
}

/// Fire-and-forget receiver of [`Event`]s.
pub trait NotificationSink {
    /// Publish an event.
    fn publish(&mut self, event: Event);
}

/// Logs every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&mut self, event: Event) {
        info!(tag = event.tag(), "{event}");
    }
}

/// Keeps every event, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Vec<Event>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the recorded events, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Forget recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&mut self, event: Event) {
        self.events.push(event);
    }
}
