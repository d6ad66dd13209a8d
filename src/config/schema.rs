//! Configuration schema for Hoist
//!
//! Configuration is stored at `~/.config/hoist/config.toml`; a
//! project-local `.hoist.toml` may override invocation defaults and add
//! target commands.

use crate::invoke::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Defaults for invocation requests built by the CLI
    pub invoke: InvokeConfig,

    /// Target name → shell command for the command executor
    pub targets: HashMap<String, String>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log at info level even without -v
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Write forwarded events as JSON lines here when `run` is not
    /// given an explicit --events path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_log: Option<PathBuf>,
}

impl GeneralConfig {
    /// Whether logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            event_log: None,
        }
    }
}

/// Invocation defaults
///
/// These only seed CLI-built requests; the core's behavior is governed
/// solely by the knobs on each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokeConfig {
    /// Default batching mode
    pub mode: ExecutionMode,

    /// Consult the result cache by default
    pub use_cache: bool,

    /// Stop at the first failed batch by default
    pub stop_on_first_failure: bool,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Together,
            use_cache: true,
            stop_on_first_failure: true,
        }
    }
}

impl Config {
    /// Overlay a project-local config: invocation defaults replace the
    /// global ones; target commands merge, local entries winning.
    pub fn merge_local(&mut self, local: Config) {
        self.invoke = local.invoke;
        self.targets.extend(local.targets);
    }
}
