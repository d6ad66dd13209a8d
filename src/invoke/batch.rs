//! Batch planning for target invocation
//!
//! Pure grouping of an ordered target list into invocation units. The
//! mode encodes the trade-off between running targets as one
//! dependency-respecting unit and stopping early across independent
//! targets.

use crate::error::{HoistError, HoistResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-empty target identifier
///
/// Case policy is the caller's; whatever it is, it must be applied
/// consistently between cache keys and batch planning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetName(String);

impl TargetName {
    /// Validate and wrap a target name
    pub fn new(name: impl Into<String>) -> HoistResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HoistError::EmptyTargetName);
        }
        Ok(Self(name))
    }

    /// The underlying identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a target list is grouped into batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// All targets as one batch, letting the executor respect
    /// inter-target dependencies
    #[default]
    Together,
    /// One batch per target, enabling stop-on-first-failure between
    /// independent targets
    Separate,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Together => write!(f, "together"),
            Self::Separate => write!(f, "separate"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = HoistError;

    fn from_str(s: &str) -> HoistResult<Self> {
        match s {
            "together" => Ok(Self::Together),
            "separate" => Ok(Self::Separate),
            other => Err(HoistError::User(format!(
                "Unknown execution mode: {other} (expected together|separate)"
            ))),
        }
    }
}

/// An ordered, non-empty group of targets invoked as one unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetBatch {
    targets: Vec<TargetName>,
}

impl TargetBatch {
    /// Wrap a non-empty target list as a batch
    pub fn new(targets: Vec<TargetName>) -> HoistResult<Self> {
        if targets.is_empty() {
            return Err(HoistError::EmptyTargetList);
        }
        Ok(Self { targets })
    }

    /// Targets in invocation order
    pub fn targets(&self) -> &[TargetName] {
        &self.targets
    }

    /// Comma-joined target names, for logging and error messages
    pub fn label(&self) -> String {
        join_targets(&self.targets)
    }
}

/// Comma-join target names for logs and error messages
pub fn join_targets(targets: &[TargetName]) -> String {
    targets
        .iter()
        .map(TargetName::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Group an ordered target list into batches
///
/// `Together` yields exactly one batch in original order and rejects an
/// empty list. `Separate` yields one singleton batch per target; an
/// empty list yields no batches. Batches never overlap and concatenate
/// back to the input.
pub fn plan_batches(
    targets: &[TargetName],
    mode: ExecutionMode,
) -> HoistResult<Vec<TargetBatch>> {
    match mode {
        ExecutionMode::Together => Ok(vec![TargetBatch::new(targets.to_vec())?]),
        ExecutionMode::Separate => targets
            .iter()
            .map(|target| TargetBatch::new(vec![target.clone()]))
            .collect(),
    }
}
