//! Bundling orchestrator.
//!
//! Walks the declaration dependency graph from an entry file, assigns each
//! reachable module a flat output name and writes one relinked `.d.ts` per
//! module into the output directory.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use log::{debug, error, info, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    emitter::{DeclarationEmitter, Diagnostic},
    json_declaration::json_to_declaration,
    module_graph::ModuleGraph,
    name_registry::NameRegistry,
    relink::relink,
    resolver::{ModuleResolver, is_json, is_recognized_extension},
    script_cache::ScriptCache,
    util::{display_path, ensure_directory, format_duration},
    visitors::collect_declaration_specifiers,
};

/// A failure attributed to one module. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// No declaration could be produced for the module
    EmitFailed { path: PathBuf, reason: String },
    /// A JSON module could not be read or parsed
    InvalidJson { path: PathBuf, reason: String },
    /// The emitter reported a problem but still produced declarations
    Diagnostic(Diagnostic),
    /// The output file for a module could not be written
    Write { path: PathBuf, reason: String },
}

impl ModuleError {
    /// The file the error is attributed to
    pub fn path(&self) -> &Path {
        match self {
            Self::EmitFailed { path, .. }
            | Self::InvalidJson { path, .. }
            | Self::Write { path, .. } => path,
            Self::Diagnostic(diagnostic) => &diagnostic.file,
        }
    }

    /// One-line description with the path shown relative to `base`
    pub fn describe(&self, base: &Path) -> String {
        let shown = display_path(self.path(), base);
        match self {
            Self::EmitFailed { reason, .. } => {
                format!("{shown} Error: Failed to emit declaration file. ({reason})")
            }
            Self::InvalidJson { reason, .. } => {
                format!("{shown} Error: Invalid JSON file. ({reason})")
            }
            Self::Diagnostic(diagnostic) => diagnostic.format(&shown),
            Self::Write { reason, .. } => {
                format!("{shown} Error: Failed to write declaration file. ({reason})")
            }
        }
    }
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(Path::new("")))
    }
}

/// Result of transforming one module
#[derive(Debug, Default)]
pub struct TransformedOutput {
    /// Relinked declaration text
    pub text: String,
    /// Resolved dependencies with a recognized extension, in document order
    pub dependencies: Vec<PathBuf>,
    pub errors: Vec<ModuleError>,
}

impl TransformedOutput {
    fn failed(error: ModuleError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }
}

/// Outcome of one [`Orchestrator::generate`] call
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Output files in the order they were written
    pub written: Vec<PathBuf>,
    pub errors: Vec<ModuleError>,
    pub elapsed: Duration,
    pub entry_found: bool,
    /// Import cycles among the processed modules, sorted
    pub cycles: Vec<Vec<PathBuf>>,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.entry_found && self.errors.is_empty()
    }
}

/// Mutable state of a single run
#[derive(Debug, Default)]
struct RunState {
    registry: NameRegistry,
    visited: FxHashSet<PathBuf>,
    /// Source texts, keyed by source path
    cache: ScriptCache,
    /// Emitted declarations, keyed by the path of the source they came from
    declarations: ScriptCache,
    graph: ModuleGraph,
}

/// Drives declaration bundling from an entry file
#[derive(Debug)]
pub struct Orchestrator<E> {
    emitter: E,
    resolver: ModuleResolver,
    /// Base directory for paths shown in log output
    display_base: PathBuf,
}

impl<E: DeclarationEmitter> Orchestrator<E> {
    pub fn new(emitter: E, resolver: ModuleResolver) -> Self {
        Self {
            emitter,
            resolver,
            display_base: PathBuf::new(),
        }
    }

    /// Show paths in log output relative to `base`
    pub fn with_display_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.display_base = base.into();
        self
    }

    /// Bundle everything reachable from `entry` into `outdir`.
    ///
    /// The entry is written as `<file_name>.d.ts`; every other module gets a
    /// name derived from its basename, suffixed `_1`, `_2`, ... on clashes.
    /// Failures are collected per module and returned in the report.
    pub fn generate(&mut self, entry: &Path, outdir: &Path, file_name: &str) -> GenerateReport {
        let start = Instant::now();
        let mut report = GenerateReport::default();

        if !entry.is_file() {
            error!(
                "The entry file {} not found",
                display_path(entry, &self.display_base)
            );
            report.elapsed = start.elapsed();
            return report;
        }
        report.entry_found = true;

        let mut state = RunState::default();
        self.resolver.clear_cache();
        state.registry.reserve(entry, file_name);
        let mut frontier: Vec<PathBuf> = vec![entry.to_path_buf()];

        while let Some(current) = frontier.pop() {
            if !state.visited.insert(current.clone()) {
                continue;
            }
            let name = state.registry.allocate(&current);
            debug!(
                "Processing {} as '{name}'",
                display_path(&current, &self.display_base)
            );

            let transformed = self.transform(&current, &mut state);
            state.graph.add_module(&current);
            for dependency in &transformed.dependencies {
                state.graph.add_dependency(&current, dependency);
            }

            let out_path = outdir.join(format!("{name}.d.ts"));
            match write_declaration(outdir, &out_path, &transformed.text) {
                Ok(()) => report.written.push(out_path),
                Err(reason) => report.errors.push(ModuleError::Write {
                    path: out_path,
                    reason,
                }),
            }

            frontier.extend(transformed.dependencies);
            report.errors.extend(transformed.errors);
        }

        report.cycles = state.graph.cycles();
        for cycle in &report.cycles {
            let members: Vec<String> = cycle
                .iter()
                .map(|path| display_path(path, &self.display_base))
                .collect();
            info!("Import cycle: {}", members.join(" -> "));
        }

        report.elapsed = start.elapsed();
        if report.errors.is_empty() {
            info!(
                "Successfully generated typings in {}",
                format_duration(report.elapsed)
            );
        } else {
            for module_error in &report.errors {
                error!("{}", module_error.describe(&self.display_base));
            }
            error!(
                "Errors occurred during generation ({} error(s))",
                report.errors.len()
            );
        }
        report
    }

    /// Produce the relinked declaration text and dependencies of one module
    fn transform(&mut self, path: &Path, state: &mut RunState) -> TransformedOutput {
        let mut errors = Vec::new();

        let declaration = if is_json(path) {
            let text = match state.cache.load(path) {
                Ok(text) => text,
                Err(err) => {
                    return TransformedOutput::failed(ModuleError::InvalidJson {
                        path: path.to_path_buf(),
                        reason: format!("{err:#}"),
                    });
                }
            };
            match json_to_declaration(&text) {
                Ok(declaration) => declaration,
                Err(err) => {
                    return TransformedOutput::failed(ModuleError::InvalidJson {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    });
                }
            }
        } else {
            let source = match state.cache.load(path) {
                Ok(source) => source,
                Err(err) => {
                    return TransformedOutput::failed(ModuleError::EmitFailed {
                        path: path.to_path_buf(),
                        reason: format!("{err:#}"),
                    });
                }
            };
            match self.emitter.emit(path, &source) {
                Ok(emitted) => {
                    errors.extend(emitted.diagnostics.into_iter().map(ModuleError::Diagnostic));
                    emitted.declaration
                }
                Err(err) => {
                    return TransformedOutput::failed(ModuleError::EmitFailed {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    });
                }
            }
        };

        let version = state.declarations.set(path, declaration.as_str());
        trace!(
            "Cached declaration of {} (version {version})",
            path.display()
        );

        let mut replacements: FxHashMap<String, String> = FxHashMap::default();
        let mut dependencies: Vec<PathBuf> = Vec::new();
        let literals = collect_declaration_specifiers(&declaration);
        for found in &literals {
            if replacements.contains_key(&found.specifier) {
                continue;
            }
            let Some(resolved) = self.resolver.resolve(&found.specifier, path) else {
                continue;
            };
            let name = state.registry.allocate(&resolved);
            replacements.insert(found.specifier.clone(), format!("./{name}"));
            if is_recognized_extension(&resolved) && !dependencies.contains(&resolved) {
                dependencies.push(resolved);
            }
        }

        TransformedOutput {
            text: relink(&declaration, &literals, &replacements).into_owned(),
            dependencies,
            errors,
        }
    }
}

fn write_declaration(outdir: &Path, out_path: &Path, text: &str) -> Result<(), String> {
    ensure_directory(outdir).map_err(|err| format!("{err:#}"))?;
    fs::write(out_path, text).map_err(|err| err.to_string())
}
