//! Live connection ownership, fan-out and keepalive.

use super::queue::{ConnectionQueue, PushOutcome};
use super::subscriptions::SubscriptionManager;
use crate::agent::domain::AgentId;
use crate::event::{domain::StreamEvent, ports::EventSink};
use crate::stream::{
    domain::{ConnectionId, SubscriptionFilter},
    ports::{SubscriptionRegistry, SubscriptionResult},
};
use futures::Stream;
use mockable::Clock;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default number of events buffered per connection.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Consumer side of a live connection.
///
/// Dropping the handle closes the connection and removes it from the
/// subscription index, so abandoned streams never linger as fan-out
/// targets.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    queue: Arc<ConnectionQueue>,
    subscriptions: Arc<SubscriptionManager>,
}

impl ConnectionHandle {
    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Waits for the next event, or returns `None` once the connection is
    /// closed.
    pub async fn recv(&self) -> Option<StreamEvent> {
        self.queue.recv().await
    }

    /// Returns how many events overflow has dropped for this connection.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.queue.dropped()
    }

    /// Converts the handle into a stream of events ending at close.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        futures::stream::unfold(self, |handle| async move {
            let event = handle.recv().await?;
            Some((event, handle))
        })
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.queue.close();
        match self.subscriptions.remove(self.id) {
            Ok(Some(_)) => tracing::info!(connection_id = %self.id, "stream connection dropped"),
            Ok(None) => {}
            Err(err) => {
                tracing::error!(
                    connection_id = %self.id,
                    error = %err,
                    "failed to unregister connection"
                );
            }
        }
    }
}

/// Owns live streaming connections and fans events out to them.
///
/// Broadcasting never blocks on a slow consumer: every connection has a
/// bounded queue and overflow only costs that connection its oldest event.
#[derive(Debug)]
pub struct StreamManager<C>
where
    C: Clock + Send + Sync,
{
    subscriptions: Arc<SubscriptionManager>,
    clock: Arc<C>,
    queue_capacity: usize,
}

impl<C> StreamManager<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a manager whose connections buffer up to `queue_capacity`
    /// events each.
    #[must_use]
    pub fn new(clock: Arc<C>, queue_capacity: usize) -> Self {
        Self {
            subscriptions: Arc::new(SubscriptionManager::new()),
            clock,
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Returns the subscription index used for routing.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// Opens an anonymous connection with `filter`.
    ///
    /// The first event the handle yields is `connection-established`,
    /// delivered to this connection only. Any caller may replace the filter
    /// of an anonymous connection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::stream::ports::SubscriptionError::LockPoisoned`] when
    /// the subscription index is unavailable.
    pub fn create_connection(
        &self,
        filter: SubscriptionFilter,
    ) -> SubscriptionResult<ConnectionHandle> {
        self.open(None, filter)
    }

    /// Opens a connection on behalf of `owner`.
    ///
    /// Only `owner` may later replace the filter.
    ///
    /// # Errors
    ///
    /// Returns [`crate::stream::ports::SubscriptionError::LockPoisoned`] when
    /// the subscription index is unavailable.
    pub fn create_owned_connection(
        &self,
        owner: AgentId,
        filter: SubscriptionFilter,
    ) -> SubscriptionResult<ConnectionHandle> {
        self.open(Some(owner), filter)
    }

    fn open(
        &self,
        owner: Option<AgentId>,
        filter: SubscriptionFilter,
    ) -> SubscriptionResult<ConnectionHandle> {
        let id = ConnectionId::new();
        let queue = Arc::new(ConnectionQueue::new(self.queue_capacity));
        queue.push(StreamEvent::connection_established(
            id.into_inner(),
            &*self.clock,
        ));
        let owned = owner.is_some();
        self.subscriptions
            .insert(id, owner, filter, Arc::clone(&queue))?;
        tracing::info!(connection_id = %id, owned, "stream connection opened");
        Ok(ConnectionHandle {
            id,
            queue,
            subscriptions: Arc::clone(&self.subscriptions),
        })
    }

    /// Appends `event` to every matching connection and returns how many
    /// connections accepted it.
    #[must_use]
    pub fn broadcast(&self, event: &StreamEvent) -> usize {
        let targets = match self.subscriptions.targets(event) {
            Ok(targets) => targets,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    event_type = %event.event_type(),
                    "event routing failed"
                );
                return 0;
            }
        };

        let mut delivered = 0_usize;
        for (connection_id, queue) in targets {
            match queue.push(event.clone()) {
                PushOutcome::Queued => delivered = delivered.saturating_add(1),
                PushOutcome::DroppedOldest => {
                    delivered = delivered.saturating_add(1);
                    tracing::debug!(
                        %connection_id,
                        dropped = queue.dropped(),
                        "queue full, dropped oldest event"
                    );
                }
                PushOutcome::Discarded => {
                    tracing::debug!(%connection_id, "queue full, keepalive discarded");
                }
                PushOutcome::Closed => {}
            }
        }
        tracing::debug!(
            event_type = %event.event_type(),
            delivered,
            "event broadcast"
        );
        delivered
    }

    /// Closes a connection and wakes its consumer with `None`.
    ///
    /// Returns `false` when the connection was not open.
    ///
    /// # Errors
    ///
    /// Returns [`crate::stream::ports::SubscriptionError::LockPoisoned`] when
    /// the subscription index is unavailable.
    pub fn close_connection(&self, connection_id: ConnectionId) -> SubscriptionResult<bool> {
        let Some(queue) = self.subscriptions.remove(connection_id)? else {
            return Ok(false);
        };
        queue.close();
        tracing::info!(%connection_id, "stream connection closed");
        Ok(true)
    }

    /// Closes every open connection, waking each consumer with `None`.
    ///
    /// Returns how many connections were closed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::stream::ports::SubscriptionError::LockPoisoned`] when
    /// the subscription index is unavailable.
    pub fn close_all(&self) -> SubscriptionResult<usize> {
        let queues = self.subscriptions.drain()?;
        for queue in &queues {
            queue.close();
        }
        tracing::info!(closed = queues.len(), "closed all stream connections");
        Ok(queues.len())
    }

    /// Returns how many connections are open.
    ///
    /// # Errors
    ///
    /// Returns [`crate::stream::ports::SubscriptionError::LockPoisoned`] when
    /// the subscription index is unavailable.
    pub fn connection_count(&self) -> SubscriptionResult<usize> {
        self.subscriptions.count()
    }

    /// Returns how many events overflow has dropped for a connection, or
    /// `None` when it is not open.
    ///
    /// # Errors
    ///
    /// Returns [`crate::stream::ports::SubscriptionError::LockPoisoned`] when
    /// the subscription index is unavailable.
    pub fn dropped_events(&self, connection_id: ConnectionId) -> SubscriptionResult<Option<u64>> {
        Ok(self
            .subscriptions
            .queue(connection_id)?
            .map(|queue| queue.dropped()))
    }
}

impl<C> StreamManager<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Broadcasts a keepalive to every open connection each `period`.
    ///
    /// The task ends once the manager is dropped; abort the returned handle
    /// to stop it earlier.
    pub fn spawn_keepalive(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(live) = manager.upgrade() else {
                    break;
                };
                let event = StreamEvent::keepalive(&*live.clock);
                let delivered = live.broadcast(&event);
                tracing::trace!(delivered, "keepalive sent");
            }
        })
    }
}

impl<C> SubscriptionRegistry for StreamManager<C>
where
    C: Clock + Send + Sync,
{
    fn replace_filter(
        &self,
        connection_id: ConnectionId,
        caller: Option<&AgentId>,
        filter: SubscriptionFilter,
    ) -> SubscriptionResult<()> {
        self.subscriptions
            .replace_filter(connection_id, caller, filter)?;
        tracing::info!(%connection_id, "subscription filter replaced");
        Ok(())
    }
}

impl<C> EventSink for StreamManager<C>
where
    C: Clock + Send + Sync,
{
    fn emit(&self, event: StreamEvent) {
        let delivered = self.broadcast(&event);
        tracing::trace!(delivered, "event emitted");
    }
}
