//! Shared library surface for the jump-run server, its CLI and tests.

pub mod api;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod loops;
pub mod resilience;
pub mod state;
