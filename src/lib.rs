//! Switchboard: agent-to-agent communication core.
//!
//! Independent agent processes use the hub to announce themselves with Agent
//! Cards, discover one another, hand work over as tasks that move through a
//! formal state machine, and follow task and channel activity in real time
//! over Server-Sent Events. Requests arrive as JSON-RPC 2.0.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture:
//!
//! - **Domain**: pure types and invariants with no infrastructure
//! - **Ports**: trait interfaces for storage, event delivery and subscriptions
//! - **Adapters**: in-memory implementations of the ports
//! - **Services**: orchestration, write ordering and event emission
//!
//! Business services publish [`event::domain::StreamEvent`] values through
//! the [`event::ports::EventSink`] port; the [`stream`] context implements it
//! and fans events out to filtered connections.
//!
//! # Modules
//!
//! - [`agent`]: Agent Card registration and discovery
//! - [`task`]: task ledger and state machine
//! - [`event`]: stream events and the event-bus port
//! - [`channel`]: named channels and wildcard patterns
//! - [`stream`]: connection management and event routing
//! - [`rpc`]: JSON-RPC 2.0 method dispatch
//! - [`http`]: axum routes for RPC, streaming and discovery
//! - [`config`], [`telemetry`], [`hub`]: runtime wiring

pub mod agent;
pub mod channel;
pub mod config;
pub mod event;
pub mod http;
pub mod hub;
pub mod rpc;
pub mod stream;
pub mod task;
pub mod telemetry;
