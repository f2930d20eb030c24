//! Real-time event delivery to streaming subscribers.
//!
//! [`services::StreamManager`] owns every live connection. Each connection
//! has a [`domain::SubscriptionFilter`] and a bounded outbound queue; the
//! [`services::SubscriptionManager`] decides which connections receive an
//! event. The manager implements the event-bus port so business services
//! publish to it without depending on it.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
