//! Unit tests for routes and stream query parsing.
