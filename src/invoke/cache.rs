//! Session-scoped invocation result cache
//!
//! Keys are (project, property snapshot, ordered target list); values
//! are the outcome of executing that batch once. The cache lives for
//! one invocation session and is never persisted.
//!
//! A conflicting store for an equal key is an error rather than an
//! overwrite: with a deterministic executor two racing invocations of
//! the same batch produce identical entries, so a conflict means the
//! executor is not deterministic for that key.

use crate::error::{HoistError, HoistResult};
use crate::invoke::batch::TargetName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Opaque handle identifying a project context
///
/// Typically a canonicalized path; canonicalization is the caller's
/// responsibility and must be applied consistently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(PathBuf);

impl ProjectId {
    /// Wrap a project path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The underlying path
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Immutable snapshot of global properties
///
/// Compared by full structural equality: same key set and same value
/// per key. Backed by a `BTreeMap` so equality and hashing are
/// independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet(BTreeMap<String, String>);

impl PropertySet {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the given pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Look up one property value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterate properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the snapshot holds no properties
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One opaque output item produced by target execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputItem {
    /// The item itself (a path, an identifier, a produced artifact)
    pub spec: String,

    /// Free-form string metadata attached by the executor
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl OutputItem {
    /// Item with no metadata
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach one metadata entry
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }
}

/// Cache key: equal iff project, properties, and ordered targets all
/// match
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    project: ProjectId,
    properties: PropertySet,
    targets: Vec<TargetName>,
}

impl CacheKey {
    /// Build a key for one batch against one project context
    pub fn new(project: ProjectId, properties: PropertySet, targets: Vec<TargetName>) -> Self {
        Self {
            project,
            properties,
            targets,
        }
    }

    /// Human-readable form for logs and conflict errors
    pub fn label(&self) -> String {
        let targets = self
            .targets
            .iter()
            .map(TargetName::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}::[{}]", self.project, targets)
    }
}

/// Outcome of one batch execution, immutable once stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Whether the batch reported success
    pub success: bool,

    /// Outputs in the order the executor produced them
    pub outputs: Vec<OutputItem>,
}

/// Result cache for one invocation session
///
/// Lookups and stores are individually atomic and may be issued from a
/// re-entered call stack. `key_guard` hands out a per-key mutex so
/// racing invocations of the same batch can single-flight without
/// serializing unrelated keys.
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    guards: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ResultCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the entry stored for `key`, if any
    pub fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).cloned()
    }

    /// Store the outcome for `key`
    ///
    /// Re-storing an identical entry is a no-op. A different entry for
    /// an equal key fails with [`HoistError::CacheConflict`].
    pub fn store(&self, key: CacheKey, entry: CacheEntry) -> HoistResult<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(existing) = entries.get(&key) {
            if *existing == entry {
                return Ok(());
            }
            return Err(HoistError::CacheConflict { key: key.label() });
        }

        debug!("Cached result for {}", key.label());
        entries.insert(key, entry);
        Ok(())
    }

    /// Single-flight guard for `key`
    ///
    /// All callers asking for the same key receive the same mutex;
    /// holding it across lookup-execute-store keeps racing invocations
    /// of one batch from executing twice.
    pub fn key_guard(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self
            .guards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guards
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Number of entries stored so far
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(project: &str, props: &[(&str, &str)], targets: &[&str]) -> CacheKey {
        CacheKey::new(
            ProjectId::new(project),
            PropertySet::from_pairs(
                props
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
            targets
                .iter()
                .map(|t| TargetName::new(*t).unwrap())
                .collect(),
        )
    }

    #[test]
    fn lookup_miss_then_hit() {
        let cache = ResultCache::new();
        let k = key("/proj/app", &[], &["Build"]);

        assert!(cache.lookup(&k).is_none());

        let entry = CacheEntry {
            success: true,
            outputs: vec![OutputItem::new("out1")],
        };
        cache.store(k.clone(), entry.clone()).unwrap();

        assert_eq!(cache.lookup(&k), Some(entry));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn differing_property_snapshots_are_distinct_keys() {
        let cache = ResultCache::new();
        let debug = key("/proj/app", &[("Configuration", "Debug")], &["Build"]);
        let release = key("/proj/app", &[("Configuration", "Release")], &["Build"]);

        assert_ne!(debug, release);

        cache
            .store(
                debug.clone(),
                CacheEntry {
                    success: true,
                    outputs: vec![],
                },
            )
            .unwrap();

        assert!(cache.lookup(&release).is_none());
    }

    #[test]
    fn property_insertion_order_is_irrelevant() {
        let forward = key("/p", &[("a", "1"), ("b", "2")], &["T"]);
        let reverse = key("/p", &[("b", "2"), ("a", "1")], &["T"]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn target_order_matters() {
        assert_ne!(key("/p", &[], &["A", "B"]), key("/p", &[], &["B", "A"]));
    }

    #[test]
    fn conflicting_store_is_an_error() {
        let cache = ResultCache::new();
        let k = key("/proj/app", &[], &["Build"]);

        cache
            .store(
                k.clone(),
                CacheEntry {
                    success: true,
                    outputs: vec![],
                },
            )
            .unwrap();

        let err = cache
            .store(
                k,
                CacheEntry {
                    success: false,
                    outputs: vec![],
                },
            )
            .unwrap_err();

        assert!(matches!(err, HoistError::CacheConflict { .. }));
        assert!(err.is_protocol_misuse());
    }

    #[test]
    fn identical_restore_is_a_noop() {
        let cache = ResultCache::new();
        let k = key("/proj/app", &[], &["Build"]);
        let entry = CacheEntry {
            success: true,
            outputs: vec![OutputItem::new("a").with_metadata("Target", "Build")],
        };

        cache.store(k.clone(), entry.clone()).unwrap();
        cache.store(k, entry).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn key_guard_is_shared_per_key() {
        let cache = ResultCache::new();
        let a = key("/p", &[], &["A"]);
        let b = key("/p", &[], &["B"]);

        assert!(Arc::ptr_eq(&cache.key_guard(&a), &cache.key_guard(&a)));
        assert!(!Arc::ptr_eq(&cache.key_guard(&a), &cache.key_guard(&b)));
    }
}
