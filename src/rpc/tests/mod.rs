//! Unit tests for envelopes, schemas and method dispatch.
