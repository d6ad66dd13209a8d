//! Target invocation orchestration
//!
//! Drives the batch planner and the result cache against an injected
//! executor, aggregating outputs and applying the configured failure
//! policy. A batch that *ran and failed* is data (`success == false`);
//! an executor error is a fault that aborts the whole invocation and
//! discards partial aggregation.

use crate::error::HoistResult;
use crate::event::{BuildEvent, BuildId, EventSink};
use crate::invoke::batch::{join_targets, plan_batches, ExecutionMode, TargetBatch, TargetName};
use crate::invoke::cache::{CacheEntry, CacheKey, OutputItem, ProjectId, PropertySet, ResultCache};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of executing one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Whether the batch reported success
    pub success: bool,

    /// Outputs in production order
    pub outputs: Vec<OutputItem>,
}

impl ExecutionOutcome {
    /// Successful outcome with the given outputs
    pub fn succeeded(outputs: Vec<OutputItem>) -> Self {
        Self {
            success: true,
            outputs,
        }
    }

    /// Failed outcome with whatever outputs were produced before the
    /// failure
    pub fn failed(outputs: Vec<OutputItem>) -> Self {
        Self {
            success: false,
            outputs,
        }
    }
}

/// Project-execution primitive, provided by the surrounding engine
///
/// `execute` may be long-running and blocking and may itself re-enter
/// the orchestrator through an `Arc`. Returning `Err` signals a fault
/// (the batch could not even be attempted) and aborts the invocation;
/// a batch that ran and failed returns `Ok` with `success == false`.
/// Must be deterministic per (project, properties, batch) when callers
/// rely on caching.
#[async_trait]
pub trait TargetExecutor: Send + Sync {
    /// Run one batch against a project context
    async fn execute(
        &self,
        project: &ProjectId,
        properties: &PropertySet,
        batch: &TargetBatch,
    ) -> HoistResult<ExecutionOutcome>;
}

/// One request to invoke a set of targets
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// Project context the targets run against
    pub project: ProjectId,

    /// Global property snapshot, part of every cache key
    pub properties: PropertySet,

    /// Targets in invocation order
    pub targets: Vec<TargetName>,

    /// How targets are grouped into batches
    pub mode: ExecutionMode,

    /// Whether to consult and populate the result cache
    pub use_cache: bool,

    /// Whether a failed batch stops the remaining batches
    pub stop_on_first_failure: bool,
}

impl InvocationRequest {
    /// Request with the default knobs: together, cached, stop on first
    /// failure
    pub fn new(project: ProjectId, targets: Vec<TargetName>) -> Self {
        Self {
            project,
            properties: PropertySet::new(),
            targets,
            mode: ExecutionMode::Together,
            use_cache: true,
            stop_on_first_failure: true,
        }
    }
}

/// Aggregated result of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// AND of all executed batches' success flags
    pub success: bool,

    /// Outputs in batch execution order, within-batch order preserved
    pub outputs: Vec<OutputItem>,
}

impl InvocationResult {
    /// The trivial result of invoking nothing
    pub fn empty_success() -> Self {
        Self {
            success: true,
            outputs: Vec::new(),
        }
    }
}

/// Drives batches through the cache and the executor for one
/// invocation session
///
/// Owns the session's [`ResultCache`]; the cache dies with the
/// orchestrator. `invoke` takes `&self`, so nested invocations through
/// an `Arc<Orchestrator>` from inside an executor are supported.
pub struct Orchestrator {
    build_id: BuildId,
    cache: ResultCache,
    sink: Option<Arc<EventSink>>,
}

impl Orchestrator {
    /// Orchestrator for one logical build, with no event sink
    pub fn new(build_id: BuildId) -> Self {
        Self {
            build_id,
            cache: ResultCache::new(),
            sink: None,
        }
    }

    /// Orchestrator that reports batch failures and a completion
    /// summary to the build's event sink
    pub fn with_sink(build_id: BuildId, sink: Arc<EventSink>) -> Self {
        Self {
            build_id,
            cache: ResultCache::new(),
            sink: Some(sink),
        }
    }

    /// The logical build this orchestrator serves
    pub fn build_id(&self) -> BuildId {
        self.build_id
    }

    /// The session's result cache
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Invoke the requested targets against `executor`
    ///
    /// An empty target list trivially succeeds without touching the
    /// executor. Batch boundaries are the only cancellation
    /// checkpoints; a running `execute` is never preempted.
    pub async fn invoke(
        &self,
        request: &InvocationRequest,
        executor: &dyn TargetExecutor,
    ) -> HoistResult<InvocationResult> {
        if request.targets.is_empty() {
            debug!("Invocation with no targets; trivial success");
            return Ok(InvocationResult::empty_success());
        }

        let batches = plan_batches(&request.targets, request.mode)?;
        info!(
            "Invoking {} target(s) in {} batch(es) against {}",
            request.targets.len(),
            batches.len(),
            request.project
        );

        let mut success = true;
        let mut outputs = Vec::new();

        for batch in &batches {
            let outcome = self.run_batch(request, batch, executor).await?;

            outputs.extend(outcome.outputs);
            if !outcome.success {
                success = false;
                self.emit(BuildEvent::error(format!(
                    "Batch [{}] failed in {}",
                    batch.label(),
                    request.project
                )))?;

                if request.stop_on_first_failure {
                    warn!("Batch [{}] failed; stopping invocation", batch.label());
                    break;
                }
                warn!("Batch [{}] failed; continuing", batch.label());
            }
        }

        self.emit(BuildEvent::message(format!(
            "Invocation of [{}] {} with {} output item(s)",
            join_targets(&request.targets),
            if success { "succeeded" } else { "failed" },
            outputs.len()
        )))?;

        Ok(InvocationResult { success, outputs })
    }

    /// Dispatch an invocation as an independent unit of work
    ///
    /// The caller's context stays unblocked while potentially
    /// long-running executions proceed; completion is awaited through
    /// the returned handle.
    pub fn spawn(
        self: &Arc<Self>,
        request: InvocationRequest,
        executor: Arc<dyn TargetExecutor>,
    ) -> JoinHandle<HoistResult<InvocationResult>> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.invoke(&request, executor.as_ref()).await })
    }

    /// Execute one batch, going through the cache when requested
    async fn run_batch(
        &self,
        request: &InvocationRequest,
        batch: &TargetBatch,
        executor: &dyn TargetExecutor,
    ) -> HoistResult<ExecutionOutcome> {
        if !request.use_cache {
            let outcome = executor
                .execute(&request.project, &request.properties, batch)
                .await?;
            return Ok(outcome);
        }

        let key = CacheKey::new(
            request.project.clone(),
            request.properties.clone(),
            batch.targets().to_vec(),
        );

        // Per-key single-flight: racing invocations of the same batch
        // serialize here without blocking unrelated keys. A nested
        // invocation of the same key would be a target cycle, which the
        // planner's callers must not produce.
        let guard = self.cache.key_guard(&key);
        let _held = guard.lock().await;

        if let Some(entry) = self.cache.lookup(&key) {
            debug!("Cache hit for {}", key.label());
            return Ok(ExecutionOutcome {
                success: entry.success,
                outputs: entry.outputs,
            });
        }

        let outcome = executor
            .execute(&request.project, &request.properties, batch)
            .await?;

        self.cache.store(
            key,
            CacheEntry {
                success: outcome.success,
                outputs: outcome.outputs.clone(),
            },
        )?;

        Ok(outcome)
    }

    /// Forward an event to the sink, if one is attached
    fn emit(&self, event: BuildEvent) -> HoistResult<()> {
        match &self.sink {
            Some(sink) => sink.consume(event, self.build_id),
            None => Ok(()),
        }
    }
}
