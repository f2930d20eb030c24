//! Unit tests for subscription filters, connection queues and fan-out.

mod queue_tests;
