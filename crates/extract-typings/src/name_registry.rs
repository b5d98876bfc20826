//! Output name allocation for bundled modules
//!
//! The NameRegistry is the single source of truth for which output file a
//! module is written to during one bundling run. It maps each resolved path to
//! a flat, unique basename and keeps per-candidate counters so that modules
//! sharing a basename receive `_1`, `_2`, ... suffixes in request order.

use std::{
    hash::BuildHasherDefault,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::resolver::strip_recognized_extension;

/// Type alias for FxHasher-based IndexMap
type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Registry of allocated output names for one run
#[derive(Debug, Default)]
pub struct NameRegistry {
    /// Map from resolved module path to its output name, in allocation order
    path_to_name: FxIndexMap<PathBuf, String>,
    /// Number of allocations made per candidate name
    candidate_counts: FxHashMap<String, usize>,
    /// Every name handed out so far
    used_names: FxHashSet<String>,
}

impl NameRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every allocation
    pub fn clear(&mut self) {
        self.path_to_name.clear();
        self.candidate_counts.clear();
        self.used_names.clear();
    }

    /// Bind `path` to an explicit `name`, bypassing candidate derivation.
    ///
    /// Used for the entry module, whose output name is chosen by the caller.
    /// The name counts as an allocation of that candidate, so a later module
    /// with the same basename is suffixed instead of overwriting it.
    pub fn reserve(&mut self, path: &Path, name: &str) {
        debug!("Reserving output name '{name}' for {}", path.display());
        *self.candidate_counts.entry(name.to_owned()).or_insert(0) += 1;
        self.used_names.insert(name.to_owned());
        self.path_to_name.insert(path.to_path_buf(), name.to_owned());
    }

    /// Return the output name of `path`, allocating one on first request.
    pub fn allocate(&mut self, path: &Path) -> String {
        if let Some(name) = self.path_to_name.get(path) {
            return name.clone();
        }

        let candidate = candidate_name(path);
        let count = self.candidate_counts.entry(candidate.clone()).or_insert(0);
        let mut name = if *count == 0 {
            candidate.clone()
        } else {
            format!("{candidate}_{count}")
        };
        *count += 1;

        // A suffixed name can collide with a module whose own basename already
        // looks like `<candidate>_<n>`; keep counting until it is free.
        while self.used_names.contains(&name) {
            let count = self.candidate_counts.entry(candidate.clone()).or_insert(0);
            name = format!("{candidate}_{count}");
            *count += 1;
        }

        debug!("Allocated output name '{name}' for {}", path.display());
        self.used_names.insert(name.clone());
        self.path_to_name.insert(path.to_path_buf(), name.clone());
        name
    }

    /// Look up the name of `path` without allocating
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.path_to_name.get(path).map(String::as_str)
    }

    /// All allocations in the order they were made
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.path_to_name
            .iter()
            .map(|(path, name)| (path.as_path(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.path_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_to_name.is_empty()
    }
}

/// Basename of `path` without a trailing recognized extension
fn candidate_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_recognized_extension(&file_name).to_owned()
}
