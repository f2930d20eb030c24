//! Named channels and wildcard pattern subscriptions.
//!
//! Channels are dot-delimited topics (`metrics.cpu`) created implicitly on
//! first publish or explicitly by an agent. Every mutation is announced on
//! the event bus; delivery to pattern subscribers is handled by the
//! streaming layer.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
