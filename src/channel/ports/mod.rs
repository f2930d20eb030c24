//! Port contracts for channel storage.

mod repository;

pub use repository::{ChannelRepository, ChannelRepositoryError, ChannelRepositoryResult};
