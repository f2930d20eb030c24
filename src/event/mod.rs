//! Immutable stream events and the event-bus port.
//!
//! Business services (the task ledger and the channel bridge) publish
//! [`domain::StreamEvent`] values through [`ports::EventSink`] without
//! knowing who delivers them. The streaming layer implements the port.

pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
