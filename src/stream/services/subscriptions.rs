//! Connection index and event routing.

use super::queue::ConnectionQueue;
use crate::agent::domain::AgentId;
use crate::event::domain::StreamEvent;
use crate::stream::{
    domain::{ConnectionId, SubscriptionFilter},
    ports::{SubscriptionError, SubscriptionRegistry, SubscriptionResult},
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug)]
struct Subscription {
    owner: Option<AgentId>,
    filter: SubscriptionFilter,
    queue: Arc<ConnectionQueue>,
}

/// Maps each live connection to its filter and outbound queue.
///
/// The index has its own lock, separate from task, agent and channel state,
/// so routing an event never waits on a business mutation.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    connections: RwLock<HashMap<ConnectionId, Subscription>>,
}

impl SubscriptionManager {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &self,
        connection_id: ConnectionId,
        owner: Option<AgentId>,
        filter: SubscriptionFilter,
        queue: Arc<ConnectionQueue>,
    ) -> SubscriptionResult<()> {
        let mut connections = self
            .connections
            .write()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        let subscription = Subscription {
            owner,
            filter,
            queue,
        };
        connections.insert(connection_id, subscription);
        Ok(())
    }

    pub(crate) fn remove(
        &self,
        connection_id: ConnectionId,
    ) -> SubscriptionResult<Option<Arc<ConnectionQueue>>> {
        let mut connections = self
            .connections
            .write()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        Ok(connections
            .remove(&connection_id)
            .map(|subscription| subscription.queue))
    }

    pub(crate) fn drain(&self) -> SubscriptionResult<Vec<Arc<ConnectionQueue>>> {
        let mut connections = self
            .connections
            .write()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        Ok(connections
            .drain()
            .map(|(_, subscription)| subscription.queue)
            .collect())
    }

    pub(crate) fn queue(
        &self,
        connection_id: ConnectionId,
    ) -> SubscriptionResult<Option<Arc<ConnectionQueue>>> {
        let connections = self
            .connections
            .read()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        Ok(connections
            .get(&connection_id)
            .map(|subscription| Arc::clone(&subscription.queue)))
    }

    /// Returns the connections whose filter matches `event`.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::LockPoisoned`] when the index is
    /// unavailable.
    pub fn route(&self, event: &StreamEvent) -> SubscriptionResult<Vec<ConnectionId>> {
        let targets = self.targets(event)?;
        Ok(targets.into_iter().map(|(id, _)| id).collect())
    }

    pub(crate) fn targets(
        &self,
        event: &StreamEvent,
    ) -> SubscriptionResult<Vec<(ConnectionId, Arc<ConnectionQueue>)>> {
        let connections = self
            .connections
            .read()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        Ok(connections
            .iter()
            .filter(|(_, subscription)| subscription.filter.matches(event))
            .map(|(id, subscription)| (*id, Arc::clone(&subscription.queue)))
            .collect())
    }

    /// Returns the current filter of a connection.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::LockPoisoned`] when the index is
    /// unavailable.
    pub fn filter(
        &self,
        connection_id: ConnectionId,
    ) -> SubscriptionResult<Option<SubscriptionFilter>> {
        let connections = self
            .connections
            .read()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        Ok(connections
            .get(&connection_id)
            .map(|subscription| subscription.filter.clone()))
    }

    /// Returns the agent that opened a connection, if it was not anonymous.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::UnknownConnection`] when the connection
    /// is not open, or [`SubscriptionError::LockPoisoned`] when the index is
    /// unavailable.
    pub fn owner(&self, connection_id: ConnectionId) -> SubscriptionResult<Option<AgentId>> {
        let connections = self
            .connections
            .read()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        connections
            .get(&connection_id)
            .map(|subscription| subscription.owner.clone())
            .ok_or(SubscriptionError::UnknownConnection(connection_id))
    }

    /// Returns how many connections are indexed.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::LockPoisoned`] when the index is
    /// unavailable.
    pub fn count(&self) -> SubscriptionResult<usize> {
        let connections = self
            .connections
            .read()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        Ok(connections.len())
    }
}

impl SubscriptionRegistry for SubscriptionManager {
    fn replace_filter(
        &self,
        connection_id: ConnectionId,
        caller: Option<&AgentId>,
        filter: SubscriptionFilter,
    ) -> SubscriptionResult<()> {
        let mut connections = self
            .connections
            .write()
            .map_err(|_| SubscriptionError::LockPoisoned)?;
        let subscription = connections
            .get_mut(&connection_id)
            .ok_or(SubscriptionError::UnknownConnection(connection_id))?;
        let foreign = subscription
            .owner
            .as_ref()
            .is_some_and(|owner| caller != Some(owner));
        if foreign {
            return Err(SubscriptionError::NotOwner(connection_id));
        }
        subscription.filter = filter;
        Ok(())
    }
}
