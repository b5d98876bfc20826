use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{path_mapping::PathMapper, util::normalize_path};

/// Extensions probed when a specifier does not name a file literally, in
/// priority order. Also the set of extensions whose modules are traversed.
pub const EXTENSIONS: [&str; 7] = [".ts", ".tsx", ".d.ts", ".d.tsx", ".js", ".jsx", ".json"];

/// Whether the final extension of `path` is one the bundler traverses
pub fn is_recognized_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|known| known[1..] == *ext))
}

/// Remove a trailing recognized extension from a file name.
///
/// Declaration suffixes are removed as a unit, so `types.d.ts` becomes
/// `types` rather than `types.d`.
pub fn strip_recognized_extension(file_name: &str) -> &str {
    let mut by_length = EXTENSIONS;
    by_length.sort_by_key(|ext| std::cmp::Reverse(ext.len()));
    for ext in by_length {
        if let Some(stem) = file_name.strip_suffix(ext).filter(|stem| !stem.is_empty()) {
            return stem;
        }
    }
    file_name
}

/// Whether `path` is a JSON document
pub fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Whether `path` already holds declarations (`.d.ts`, `.d.tsx`, ...)
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.ends_with(".d.ts")
                || name.ends_with(".d.tsx")
                || name.ends_with(".d.mts")
                || name.ends_with(".d.cts")
        })
}

/// Resolves import specifiers found in declarations to files on disk
#[derive(Debug)]
pub struct ModuleResolver {
    mapper: PathMapper,
    /// Cache of resolved specifiers, keyed by importing directory and specifier
    module_cache: IndexMap<(PathBuf, String), Option<PathBuf>>,
}

impl ModuleResolver {
    pub fn new(mapper: PathMapper) -> Self {
        Self {
            mapper,
            module_cache: IndexMap::new(),
        }
    }

    /// Resolver without any alias mappings
    pub fn relative_only() -> Self {
        Self::new(PathMapper::default())
    }

    /// Resolve `specifier` as written in `importer` to an absolute file path.
    ///
    /// Alias mappings are tried first, then the specifier is joined onto the
    /// importer's directory. The resulting path is accepted literally if it
    /// names a file, otherwise each of [`EXTENSIONS`] is appended in turn.
    pub fn resolve(&mut self, specifier: &str, importer: &Path) -> Option<PathBuf> {
        let importer_dir = importer.parent().unwrap_or_else(|| Path::new("/"));
        let key = (importer_dir.to_path_buf(), specifier.to_owned());
        if let Some(cached) = self.module_cache.get(&key) {
            return cached.clone();
        }

        let resolved = self.resolve_uncached(specifier, importer_dir);
        match &resolved {
            Some(path) => debug!("Resolved '{specifier}' -> {}", path.display()),
            None => debug!(
                "Leaving '{specifier}' unresolved (imported from {})",
                importer.display()
            ),
        }
        self.module_cache.insert(key, resolved.clone());
        resolved
    }

    /// Forget every memoised resolution
    pub fn clear_cache(&mut self) {
        self.module_cache.clear();
    }

    fn resolve_uncached(&self, specifier: &str, importer_dir: &Path) -> Option<PathBuf> {
        let base = match self.mapper.resolve(specifier, &EXTENSIONS) {
            Some(mapped) => {
                trace!("Alias mapping matched '{specifier}' -> {}", mapped.display());
                mapped
            }
            None => importer_dir.join(specifier),
        };
        probe_with_extensions(&normalize_path(&base))
    }
}

/// Accept `base` if it is a file, otherwise the first `base + ext` that is.
pub(crate) fn probe_with_extensions(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    EXTENSIONS.iter().find_map(|ext| {
        let mut candidate = base.as_os_str().to_os_string();
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        candidate.is_file().then_some(candidate)
    })
}
