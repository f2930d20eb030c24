//! Port contracts for Agent Card storage.
//!
//! Ports define infrastructure-agnostic interfaces used by agent services.

pub mod repository;

pub use repository::{AgentRepository, AgentRepositoryError, AgentRepositoryResult};
