//! Step definitions shared by the hub behaviour scenarios.

mod given;
mod then;
mod when;
pub mod world;
