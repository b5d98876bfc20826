//! Versioned source store backing declaration emit.
//!
//! Every `set` bumps the per-path version so consumers holding an older
//! version can tell their view is stale. One cache lives for exactly one
//! bundling run.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct CachedScript {
    text: Arc<str>,
    version: u32,
}

/// Mapping from file path to its current text and version
#[derive(Debug, Default)]
pub struct ScriptCache {
    scripts: FxHashMap<PathBuf, CachedScript>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` for `path`, returning the new version (first write is 1).
    pub fn set(&mut self, path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> u32 {
        let text = text.into();
        let entry = self
            .scripts
            .entry(path.into())
            .and_modify(|script| {
                script.text = Arc::clone(&text);
                script.version += 1;
            })
            .or_insert_with(|| CachedScript {
                text: Arc::clone(&text),
                version: 1,
            });
        entry.version
    }

    /// Current text and version of `path`, if cached
    pub fn get(&self, path: &Path) -> Option<(Arc<str>, u32)> {
        self.scripts
            .get(path)
            .map(|script| (Arc::clone(&script.text), script.version))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.scripts.contains_key(path)
    }

    /// Version of `path`, or 0 when it has never been cached
    pub fn version(&self, path: &Path) -> u32 {
        self.scripts.get(path).map_or(0, |script| script.version)
    }

    /// Return the cached text of `path`, reading it from disk on a miss.
    pub fn load(&mut self, path: &Path) -> Result<Arc<str>> {
        if let Some((text, _)) = self.get(path) {
            return Ok(text);
        }
        let text: Arc<str> = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .into();
        self.set(path, Arc::clone(&text));
        Ok(text)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
