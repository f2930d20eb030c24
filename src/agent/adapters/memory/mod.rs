//! In-memory adapters for the agent registry.

mod registry;

pub use registry::InMemoryAgentRepository;
