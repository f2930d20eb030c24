//! Domain model for named pub/sub channels.

mod channel;
mod error;
mod name;

pub use channel::Channel;
pub use error::ChannelDomainError;
pub use name::{ChannelName, ChannelPattern};
