//! Hoist - build-event relay and target invocation core
//!
//! The worker-side primitives of a multi-process build engine: a
//! per-build event sink that forwards envelopes to an aggregator, and
//! a target invocation orchestrator with batching, result caching, and
//! configurable failure semantics.

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod executor;
pub mod invoke;

pub use error::{HoistError, HoistResult};
