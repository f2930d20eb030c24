//! Event sink port.

use crate::event::domain::StreamEvent;

/// Receiver of events produced by business services.
///
/// Implementations must not block: `emit` is called while the producing
/// service holds its ordering gate, and it must never call back into the
/// producer.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    /// Publishes `event` to every interested subscriber.
    fn emit(&self, event: StreamEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: StreamEvent) {}
}
