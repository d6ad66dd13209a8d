//! Error types for Hoist
//!
//! All modules use `HoistResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Hoist operations
pub type HoistResult<T> = Result<T, HoistError>;

/// All errors that can occur in Hoist
#[derive(Error, Debug)]
pub enum HoistError {
    // Protocol misuse: programmer errors, never retried or swallowed
    #[error("Event sink is shut down; no further events may be consumed")]
    SinkShutDown,

    #[error("Conflicting cache entry for key: {key}")]
    CacheConflict { key: String },

    #[error("Cannot plan a single batch from an empty target list")]
    EmptyTargetList,

    #[error("Target name must not be empty")]
    EmptyTargetName,

    // Execution faults: the invocation could not even be attempted
    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    #[error("No command configured for target: {target}")]
    TargetCommandMissing { target: String },

    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl HoistError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Whether this error indicates incorrect use of a core contract
    /// (as opposed to an environmental or execution problem).
    pub fn is_protocol_misuse(&self) -> bool {
        matches!(
            self,
            Self::SinkShutDown
                | Self::CacheConflict { .. }
                | Self::EmptyTargetList
                | Self::EmptyTargetName
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::TargetCommandMissing { .. } => {
                Some("Add the target under [targets] in .hoist.toml")
            }
            Self::ProjectNotFound(_) => Some("Check the --project path"),
            _ => None,
        }
    }
}
