//! Unit tests for stream event construction and serialization.

mod event_tests;
