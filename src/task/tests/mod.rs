//! Unit tests for the task ledger.

mod domain_tests;
