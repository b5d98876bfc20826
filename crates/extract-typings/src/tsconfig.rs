//! Project configuration: locating and reading `tsconfig.json`.
//!
//! Only the options that influence declaration bundling are read:
//! `baseUrl`, `paths` and `stripInternal`. `extends` chains are followed and
//! merged key by key, later configs overriding earlier ones.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::{path_mapping::PathMapper, util::normalize_path};

/// Default config file name searched for when no project is given
pub const DEFAULT_CONFIG_NAME: &str = "tsconfig.json";

/// The parts of a loaded `tsconfig.json` the bundler uses
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Absolute path of the config file that was loaded
    pub config_path: PathBuf,
    /// Directory containing `config_path`
    pub root_dir: PathBuf,
    /// Absolute `baseUrl`, if any config in the chain set one
    pub base_url: Option<PathBuf>,
    /// `paths` table in declaration order
    pub paths: IndexMap<String, Vec<String>>,
    /// Directory `paths` substitutions are resolved against
    pub paths_base: PathBuf,
    /// Drop declarations annotated with `@internal`
    pub strip_internal: bool,
}

impl ProjectConfig {
    /// Locate and load the project configuration.
    ///
    /// `project` may name a config file, a directory containing
    /// `tsconfig.json`, or a bare config file name searched for upward from
    /// `root`. Without `project`, `tsconfig.json` is searched for upward.
    pub fn discover(root: &Path, project: Option<&Path>) -> Result<Self> {
        let config_path = find_config_file(root, project)?;
        Self::load(&config_path)
    }

    /// Load the config at `config_path`, following `extends`
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = normalize_path(config_path);
        let root_dir = config_path
            .parent()
            .ok_or_else(|| anyhow!("Invalid tsconfig path {}", config_path.display()))?
            .to_path_buf();

        let mut visited = FxHashSet::default();
        let options = load_options(&config_path, &mut visited)?;

        let paths_base = options
            .base_url
            .clone()
            .or(options.paths_dir)
            .unwrap_or_else(|| root_dir.clone());

        let config = Self {
            base_url: options.base_url,
            paths: options.paths.unwrap_or_default(),
            paths_base,
            strip_internal: options.strip_internal.unwrap_or(false),
            config_path,
            root_dir,
        };
        // Surface malformed patterns now rather than on first lookup.
        config.path_mapper()?;
        debug!(
            "Loaded {} ({} path mapping(s))",
            config.config_path.display(),
            config.paths.len()
        );
        Ok(config)
    }

    /// Compile the `paths` table into a mapper
    pub fn path_mapper(&self) -> Result<PathMapper> {
        PathMapper::new(self.paths_base.clone(), &self.paths).with_context(|| {
            format!(
                "Invalid compilerOptions.paths in {}",
                self.config_path.display()
            )
        })
    }
}

/// Find the config file for `root`/`project`.
pub fn find_config_file(root: &Path, project: Option<&Path>) -> Result<PathBuf> {
    if let Some(project) = project {
        let candidate = if project.is_absolute() {
            project.to_path_buf()
        } else {
            root.join(project)
        };
        if candidate.is_file() {
            return Ok(normalize_path(&candidate));
        }
        if candidate.is_dir() {
            let nested = candidate.join(DEFAULT_CONFIG_NAME);
            if nested.is_file() {
                return Ok(normalize_path(&nested));
            }
            bail!("Could not find a '{DEFAULT_CONFIG_NAME}' file in {}", candidate.display());
        }
        // A bare name such as `tsconfig.build.json` is searched for upward.
        if project.components().count() == 1
            && let Some(found) = search_upward(root, &project.to_string_lossy())
        {
            return Ok(found);
        }
        bail!(
            "Could not find a valid '{}' file from {}",
            project.display(),
            root.display()
        );
    }

    search_upward(root, DEFAULT_CONFIG_NAME).ok_or_else(|| {
        anyhow!("Could not find a valid '{DEFAULT_CONFIG_NAME}' file in the current directory.")
    })
}

fn search_upward(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
        .map(|found| normalize_path(&found))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(single) => vec![single],
            Self::Many(many) => many,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    #[serde(default)]
    extends: Option<Extends>,
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<IndexMap<String, Vec<String>>>,
    #[serde(default)]
    strip_internal: Option<bool>,
}

/// Compiler options with every path already anchored to the config that
/// declared it
#[derive(Debug, Clone, Default)]
struct ResolvedOptions {
    base_url: Option<PathBuf>,
    paths: Option<IndexMap<String, Vec<String>>>,
    /// Directory of the config that declared `paths`
    paths_dir: Option<PathBuf>,
    strip_internal: Option<bool>,
}

impl ResolvedOptions {
    fn from_raw(raw: RawCompilerOptions, config_dir: &Path) -> Self {
        Self {
            base_url: raw
                .base_url
                .map(|base| normalize_path(&config_dir.join(base))),
            paths_dir: raw.paths.as_ref().map(|_| config_dir.to_path_buf()),
            paths: raw.paths,
            strip_internal: raw.strip_internal,
        }
    }

    fn merge(base: Self, overlay: Self) -> Self {
        let (paths, paths_dir) = if overlay.paths.is_some() {
            (overlay.paths, overlay.paths_dir)
        } else {
            (base.paths, base.paths_dir)
        };
        Self {
            base_url: overlay.base_url.or(base.base_url),
            paths,
            paths_dir,
            strip_internal: overlay.strip_internal.or(base.strip_internal),
        }
    }
}

fn load_options(path: &Path, visited: &mut FxHashSet<PathBuf>) -> Result<ResolvedOptions> {
    if !visited.insert(path.to_path_buf()) {
        bail!(
            "Circularity detected while resolving configuration: {}",
            path.display()
        );
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Error reading '{}'", path.display()))?;
    let raw: RawTsConfig = json5::from_str(&text)
        .with_context(|| format!("Error parsing '{}'", path.display()))?;

    let config_dir = path
        .parent()
        .ok_or_else(|| anyhow!("Invalid tsconfig path {}", path.display()))?;

    let mut merged = ResolvedOptions::default();
    for extends in raw.extends.map(Extends::into_vec).unwrap_or_default() {
        let extends_path = resolve_extends_path(config_dir, &extends)?;
        debug!("{} extends {}", path.display(), extends_path.display());
        let base = load_options(&extends_path, visited)?;
        merged = ResolvedOptions::merge(merged, base);
    }

    // Only configs on the current `extends` path count towards a cycle.
    visited.remove(path);
    let own = ResolvedOptions::from_raw(raw.compiler_options, config_dir);
    Ok(ResolvedOptions::merge(merged, own))
}

fn resolve_extends_path(config_dir: &Path, extends: &str) -> Result<PathBuf> {
    if extends.starts_with('.') || Path::new(extends).is_absolute() {
        return resolve_extends_file(&normalize_path(&config_dir.join(extends)));
    }

    for ancestor in config_dir.ancestors() {
        let base = ancestor.join("node_modules").join(extends);
        if let Ok(resolved) = resolve_extends_file(&base) {
            return Ok(resolved);
        }
    }

    bail!(
        "Failed to resolve extended config '{extends}' from {}",
        config_dir.display()
    )
}

fn resolve_extends_file(candidate: &Path) -> Result<PathBuf> {
    let mut attempts = vec![candidate.to_path_buf()];
    if candidate.extension().is_none_or(|ext| ext != "json") {
        let mut with_json = candidate.as_os_str().to_os_string();
        with_json.push(".json");
        attempts.push(PathBuf::from(with_json));
    }
    attempts.push(candidate.join(DEFAULT_CONFIG_NAME));

    attempts
        .into_iter()
        .find(|attempt| attempt.is_file())
        .map(|found| normalize_path(&found))
        .ok_or_else(|| anyhow!("Extended config {} does not exist", candidate.display()))
}
