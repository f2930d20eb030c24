//! Unit tests for channel names, patterns and the channel bridge.

mod bridge_tests;
