//! Adapter implementations for channel ports.

pub mod memory;
