//! Domain model for streaming connections.

mod filter;
mod ids;

pub use filter::SubscriptionFilter;
pub use ids::ConnectionId;
