//! Target invocation with batching, caching, and failure policy
//!
//! A request names an ordered set of targets to run against one project
//! context. Targets are grouped into batches, each batch is executed at
//! most once per (project, properties, targets) key when caching is on,
//! and outputs are aggregated in batch order.

pub mod batch;
pub mod cache;
pub mod orchestrator;

pub use batch::{plan_batches, ExecutionMode, TargetBatch, TargetName};
pub use cache::{CacheEntry, CacheKey, OutputItem, ProjectId, PropertySet, ResultCache};
pub use orchestrator::{
    ExecutionOutcome, InvocationRequest, InvocationResult, Orchestrator, TargetExecutor,
};
