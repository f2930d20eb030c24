//! Connection management, routing and fan-out.

mod manager;
mod queue;
mod subscriptions;

pub use manager::{ConnectionHandle, DEFAULT_QUEUE_CAPACITY, StreamManager};
pub use queue::{ConnectionQueue, PushOutcome};
pub use subscriptions::SubscriptionManager;
