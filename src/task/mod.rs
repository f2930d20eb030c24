//! Task ledger: long-running, cancellable units of work.
//!
//! A task is created in `submitted` and moves through a validated state
//! machine until it reaches one of the terminal states `completed`,
//! `failed` or `cancelled`. Every successful mutation is reported through
//! the [`crate::event::ports::EventSink`] port before the operation returns,
//! so observers see changes in the order they were applied. The module
//! follows hexagonal architecture:
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
