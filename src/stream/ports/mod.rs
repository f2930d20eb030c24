//! Port contracts exposed by the streaming layer.

mod registry;

pub use registry::{SubscriptionError, SubscriptionRegistry, SubscriptionResult};
