//! Command-backed target executor
//!
//! Backs the CLI: each target name maps to a configured shell command,
//! run with the project directory as working directory and the
//! property snapshot exported into the environment. Stdout lines become
//! output items tagged with the producing target.

use crate::error::{HoistError, HoistResult};
use crate::invoke::{
    ExecutionOutcome, OutputItem, ProjectId, PropertySet, TargetBatch, TargetExecutor,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Runs configured shell commands, one per target
pub struct CommandExecutor {
    commands: HashMap<String, String>,
}

impl CommandExecutor {
    /// Executor over a target-name → shell-command table
    pub fn new(commands: HashMap<String, String>) -> Self {
        Self { commands }
    }

    /// The command configured for `target`, if any
    pub fn command_for(&self, target: &str) -> Option<&str> {
        self.commands.get(target).map(String::as_str)
    }

    async fn run_target(
        &self,
        project: &ProjectId,
        properties: &PropertySet,
        target: &str,
    ) -> HoistResult<(bool, Vec<OutputItem>)> {
        let command = self
            .command_for(target)
            .ok_or_else(|| HoistError::TargetCommandMissing {
                target: target.to_string(),
            })?;

        debug!("Running target {}: {}", target, command);

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(project.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (name, value) in properties.iter() {
            cmd.env(name, value);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| HoistError::command_failed(command, e))?;

        let items = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| OutputItem::new(line).with_metadata("Target", target))
            .collect();

        Ok((output.status.success(), items))
    }
}

#[async_trait]
impl TargetExecutor for CommandExecutor {
    /// Run the batch's targets in order
    ///
    /// A missing project directory or an unconfigured target is a
    /// fault. A non-zero exit is a failure; the batch is one unit, so
    /// remaining targets in it are skipped once a target fails.
    async fn execute(
        &self,
        project: &ProjectId,
        properties: &PropertySet,
        batch: &TargetBatch,
    ) -> HoistResult<ExecutionOutcome> {
        if !project.path().is_dir() {
            return Err(HoistError::ProjectNotFound(project.path().to_path_buf()));
        }

        let mut outputs = Vec::new();
        for target in batch.targets() {
            let (success, items) = self
                .run_target(project, properties, target.as_str())
                .await?;
            outputs.extend(items);

            if !success {
                info!("Target {} failed", target);
                return Ok(ExecutionOutcome::failed(outputs));
            }
        }

        Ok(ExecutionOutcome::succeeded(outputs))
    }
}
