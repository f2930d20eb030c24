//! Adapter implementations for Agent Card storage ports.

pub mod memory;
