//! Port contracts for publishing stream events.

mod sink;

#[cfg(test)]
pub use sink::MockEventSink;
pub use sink::{EventSink, NullEventSink};
