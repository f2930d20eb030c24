//! Bounded per-connection event queue.

use crate::event::domain::StreamEvent;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Result of offering an event to a connection queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The event was appended without loss.
    Queued,
    /// The queue was full; the oldest buffered event was dropped to make room.
    DroppedOldest,
    /// The queue was full and the incoming keepalive was discarded.
    Discarded,
    /// The connection is closed; nothing was queued.
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<StreamEvent>,
    closed: bool,
    dropped: u64,
}

/// Single-consumer queue with connection-local backpressure.
///
/// Producers never wait: when the queue is full the oldest non-keepalive
/// event is dropped. The consumer suspends in [`ConnectionQueue::recv`]
/// until an event arrives or the queue is closed.
#[derive(Debug)]
pub struct ConnectionQueue {
    state: Mutex<QueueState>,
    ready: Notify,
    capacity: usize,
}

impl ConnectionQueue {
    /// Creates an open queue holding at most `capacity` events (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            ready: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    // No code path panics while holding the lock, so a poisoned state is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `event`, applying the overflow policy when full.
    pub fn push(&self, event: StreamEvent) -> PushOutcome {
        let outcome = {
            let mut state = self.lock();
            if state.closed {
                return PushOutcome::Closed;
            }

            if state.events.len() < self.capacity {
                state.events.push_back(event);
                PushOutcome::Queued
            } else if event.is_keepalive() {
                state.dropped = state.dropped.saturating_add(1);
                return PushOutcome::Discarded;
            } else {
                let victim = state
                    .events
                    .iter()
                    .position(|queued| !queued.is_keepalive())
                    .unwrap_or(0);
                state.events.remove(victim);
                state.events.push_back(event);
                state.dropped = state.dropped.saturating_add(1);
                PushOutcome::DroppedOldest
            }
        };
        self.ready.notify_one();
        outcome
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the queue is closed; events buffered before the
    /// close are discarded.
    pub async fn recv(&self) -> Option<StreamEvent> {
        loop {
            let notified = self.ready.notified();
            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(event) = state.events.pop_front() {
                    return Some(event);
                }
            }
            notified.await;
        }
    }

    /// Closes the queue, releasing buffered events and waking the consumer.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            state.closed = true;
            state.events.clear();
        }
        self.ready.notify_one();
    }

    /// Returns whether the queue has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns how many buffered events are waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Returns whether no event is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Returns how many events overflow has cost this connection.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}
