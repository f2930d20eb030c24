//! Subscription registry port.

use crate::agent::domain::AgentId;
use crate::stream::domain::{ConnectionId, SubscriptionFilter};
use thiserror::Error;

/// Result type for subscription registry operations.
pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

/// Index of live connections that accepts filter replacement.
///
/// Implemented by the streaming layer and consumed by services that change
/// what a connection receives without owning the connection.
pub trait SubscriptionRegistry: Send + Sync {
    /// Replaces the filter of a connection. Filters are never merged.
    ///
    /// A connection opened by a known agent only accepts filters from that
    /// agent. Anonymous connections accept any caller.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::UnknownConnection`] when the connection
    /// is not open, or [`SubscriptionError::NotOwner`] when `caller` did not
    /// open it.
    fn replace_filter(
        &self,
        connection_id: ConnectionId,
        caller: Option<&AgentId>,
        filter: SubscriptionFilter,
    ) -> SubscriptionResult<()>;
}

/// Errors returned by subscription registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// No open connection has the identifier.
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// The connection was opened by another agent.
    #[error("connection {0} belongs to another agent")]
    NotOwner(ConnectionId),

    /// The subscription index lock was poisoned by a panicking writer.
    #[error("subscription index is unavailable")]
    LockPoisoned,
}
