//! Unit tests for Agent Card registration and discovery.

mod service_tests;
