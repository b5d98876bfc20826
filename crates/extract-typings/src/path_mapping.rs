//! Alias resolution compiled from `compilerOptions.baseUrl` / `paths`.
//!
//! A mapper is built once per configuration and then consulted by the
//! resolver before relative resolution is attempted.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Result, bail};
use indexmap::IndexMap;
use log::trace;
use serde::Deserialize;

use crate::util::normalize_path;

/// Fields of `package.json` consulted when an alias target is a directory
const PACKAGE_ENTRY_FIELDS: [&str; 3] = ["types", "typings", "main"];

#[derive(Debug, Clone)]
struct PathPattern {
    pattern: String,
    prefix: String,
    /// `None` for exact patterns without a wildcard
    suffix: Option<String>,
    targets: Vec<String>,
}

impl PathPattern {
    fn parse(pattern: &str, targets: &[String]) -> Result<Self> {
        if pattern.matches('*').count() > 1 {
            bail!("Pattern '{pattern}' can have at most one '*' character");
        }
        for target in targets {
            if target.matches('*').count() > 1 {
                bail!(
                    "Substitution '{target}' in pattern '{pattern}' can have at most one '*' \
                     character"
                );
            }
        }
        if targets.is_empty() {
            bail!("Substitutions for pattern '{pattern}' shouldn't be an empty array");
        }

        let (prefix, suffix) = match pattern.split_once('*') {
            Some((prefix, suffix)) => (prefix.to_owned(), Some(suffix.to_owned())),
            None => (pattern.to_owned(), None),
        };
        Ok(Self {
            pattern: pattern.to_owned(),
            prefix,
            suffix,
            targets: targets.to_vec(),
        })
    }

    /// Text captured by the wildcard when `specifier` matches
    fn capture<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        let suffix = self.suffix.as_deref()?;
        if specifier.len() < self.prefix.len() + suffix.len() {
            return None;
        }
        specifier
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(suffix)
    }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    types: Option<String>,
    typings: Option<String>,
    main: Option<String>,
}

impl PackageManifest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "types" => self.types.as_deref(),
            "typings" => self.typings.as_deref(),
            "main" => self.main.as_deref(),
            _ => None,
        }
    }
}

/// Compiled `paths` table anchored at an absolute base directory
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    base_url: PathBuf,
    patterns: Vec<PathPattern>,
}

impl PathMapper {
    /// Compile `paths` relative to `base_url`. Patterns or substitutions
    /// with more than one `*` are rejected.
    pub fn new(base_url: impl Into<PathBuf>, paths: &IndexMap<String, Vec<String>>) -> Result<Self> {
        let patterns = paths
            .iter()
            .map(|(pattern, targets)| PathPattern::parse(pattern, targets))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            base_url: base_url.into(),
            patterns,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn base_url(&self) -> &Path {
        &self.base_url
    }

    /// Map `specifier` through the alias table to an existing file.
    ///
    /// Returns `None` when no pattern matches or when none of the
    /// substituted candidates exists under any of `extensions`.
    pub fn resolve(&self, specifier: &str, extensions: &[&str]) -> Option<PathBuf> {
        let (pattern, captured) = self.best_match(specifier)?;
        trace!("'{specifier}' matched path pattern '{}'", pattern.pattern);

        pattern.targets.iter().find_map(|target| {
            let substituted = match captured {
                Some(captured) => target.replacen('*', captured, 1),
                None => target.clone(),
            };
            let candidate = normalize_path(&self.base_url.join(substituted));
            find_existing(&candidate, extensions)
        })
    }

    /// Exact patterns win; otherwise the wildcard pattern with the longest
    /// matching prefix, first declared on ties.
    fn best_match<'s>(&self, specifier: &'s str) -> Option<(&PathPattern, Option<&'s str>)> {
        if let Some(exact) = self
            .patterns
            .iter()
            .find(|pattern| pattern.suffix.is_none() && pattern.prefix == specifier)
        {
            return Some((exact, None));
        }

        let mut best: Option<(&PathPattern, &'s str)> = None;
        for pattern in &self.patterns {
            let Some(captured) = pattern.capture(specifier) else {
                continue;
            };
            if best.is_none_or(|(current, _)| pattern.prefix.len() > current.prefix.len()) {
                best = Some((pattern, captured));
            }
        }
        best.map(|(pattern, captured)| (pattern, Some(captured)))
    }
}

/// Resolve an alias candidate the way module resolution treats a path: the
/// file itself, the file plus an extension, then a directory's package entry
/// or index file.
fn find_existing(candidate: &Path, extensions: &[&str]) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    if let Some(found) = with_extensions(candidate, extensions) {
        return Some(found);
    }
    if !candidate.is_dir() {
        return None;
    }

    if let Some(manifest) = read_package_manifest(&candidate.join("package.json")) {
        for field in PACKAGE_ENTRY_FIELDS {
            let Some(entry) = manifest.field(field) else {
                continue;
            };
            let entry_path = normalize_path(&candidate.join(entry));
            if entry_path.is_file() {
                return Some(entry_path);
            }
            if let Some(found) = with_extensions(&entry_path, extensions) {
                return Some(found);
            }
        }
    }

    with_extensions(&candidate.join("index"), extensions)
}

fn with_extensions(base: &Path, extensions: &[&str]) -> Option<PathBuf> {
    extensions.iter().find_map(|ext| {
        let mut path = base.as_os_str().to_os_string();
        path.push(ext);
        let path = PathBuf::from(path);
        path.is_file().then_some(path)
    })
}

fn read_package_manifest(path: &Path) -> Option<PackageManifest> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            trace!("Ignoring unreadable {}: {err}", path.display());
            None
        }
    }
}
