//! Agent Card registration and discovery.
//!
//! Agents announce themselves with an Agent Card: an identity and capability
//! descriptor that peers use to decide which agent should receive a task.
//! Registration is an upsert keyed by the card identifier, so a
//! re-registration fully replaces the previous record. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
