//! Bundle the declaration surface of a TypeScript project into a flat
//! directory of self-contained `.d.ts` files.
//!
//! ```no_run
//! use extract_typings::{ExtractOptions, extract};
//!
//! let report = extract(&ExtractOptions::new("src/index.ts"))?;
//! assert!(report.is_success());
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;

pub mod config;
pub mod emitter;
pub mod json_declaration;
pub mod module_graph;
pub mod name_registry;
pub mod orchestrator;
pub mod path_mapping;
pub mod relink;
pub mod resolver;
pub mod script_cache;
pub mod tsconfig;
pub mod util;
pub mod visitors;

use crate::{
    config::{DEFAULT_FILE_NAME, DEFAULT_OUTDIR},
    emitter::IsolatedDeclarationEmitter,
    resolver::ModuleResolver,
    tsconfig::ProjectConfig,
    util::{absolutize, clean_directory, ensure_directory},
};
pub use crate::orchestrator::{GenerateReport, ModuleError, Orchestrator};

/// Options for a single [`extract`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Entry source file
    pub entry: PathBuf,
    /// Output directory
    pub outdir: PathBuf,
    /// Output name of the entry module; a trailing `.d.ts` is ignored
    pub file_name: String,
    /// Delete `outdir` before writing
    pub auto_clean: bool,
    /// Explicit `tsconfig.json` file or directory
    pub project: Option<PathBuf>,
    /// Directory the project configuration is searched from
    pub root: PathBuf,
}

impl ExtractOptions {
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            file_name: DEFAULT_FILE_NAME.to_owned(),
            auto_clean: false,
            project: None,
            root: PathBuf::from("."),
        }
    }

    /// `file_name` without a trailing `.d.ts`
    pub fn output_name(&self) -> &str {
        self.file_name
            .strip_suffix(".d.ts")
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.file_name)
    }
}

/// Load the project configuration and bundle the declarations reachable from
/// `options.entry`.
///
/// Configuration problems are returned as errors. Problems with individual
/// modules, including a missing entry file, are reported in the returned
/// [`GenerateReport`].
pub fn extract(options: &ExtractOptions) -> Result<GenerateReport> {
    let cwd = env::current_dir().context("Failed to determine the current directory")?;
    extract_in(options, &cwd)
}

/// [`extract`] with relative paths resolved against `cwd`
pub fn extract_in(options: &ExtractOptions, cwd: &Path) -> Result<GenerateReport> {
    let root = absolutize(&options.root, cwd);
    let entry = absolutize(&options.entry, cwd);
    let outdir = absolutize(&options.outdir, cwd);

    let project = ProjectConfig::discover(&root, options.project.as_deref())?;
    debug!("Using project config {}", project.config_path.display());
    let resolver = ModuleResolver::new(project.path_mapper()?);
    let emitter = IsolatedDeclarationEmitter::new(project.strip_internal);

    if options.auto_clean {
        clean_directory(&outdir)?;
    }
    ensure_directory(&outdir)?;

    let mut orchestrator = Orchestrator::new(emitter, resolver).with_display_base(cwd);
    Ok(orchestrator.generate(&entry, &outdir, options.output_name()))
}
