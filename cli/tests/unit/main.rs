//! Unit tests for convoy
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod architecture;
mod mocks;
mod ssh_transport;
