//! In-memory channel adapters.

mod channel;

pub use channel::InMemoryChannelRepository;
