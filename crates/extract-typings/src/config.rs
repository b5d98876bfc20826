//! Tool configuration.
//!
//! Settings are layered, later layers overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. user config: `<config dir>/extract-typings/extract-typings.toml`
//! 3. project config: `extract-typings.toml` in the working directory
//! 4. an explicit `--config` file
//! 5. `EXTRACT_TYPINGS_*` environment variables
//! 6. command line flags
//!
//! Example:
//!
//! ```toml
//! entry = "src/index.ts"
//! outdir = "dist/typings"
//! file-name = "index"
//! clean = true
//! project = "tsconfig.build.json"
//! ```

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use etcetera::BaseStrategy;
use log::debug;
use serde::Deserialize;

/// File name of user and project config files
pub const CONFIG_FILE_NAME: &str = "extract-typings.toml";

/// Prefix of the environment variables read by [`Config::apply_env`]
pub const ENV_PREFIX: &str = "EXTRACT_TYPINGS_";

pub const DEFAULT_OUTDIR: &str = "./dist/typings";
pub const DEFAULT_FILE_NAME: &str = "index";

/// Resolved tool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub entry: Option<PathBuf>,
    pub outdir: PathBuf,
    pub file_name: String,
    pub clean: bool,
    pub project: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: None,
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            file_name: DEFAULT_FILE_NAME.to_owned(),
            clean: false,
            project: None,
        }
    }
}

/// One layer of settings; unset fields leave the lower layer untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigOverrides {
    pub entry: Option<PathBuf>,
    pub outdir: Option<PathBuf>,
    pub file_name: Option<String>,
    pub clean: Option<bool>,
    pub project: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut overrides: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        // Paths in a config file are relative to the file itself.
        if let Some(dir) = path.parent() {
            overrides.anchor(dir);
        }
        Ok(overrides)
    }

    fn anchor(&mut self, dir: &Path) {
        for path in [&mut self.entry, &mut self.outdir, &mut self.project]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}

impl Config {
    /// Load every file and environment layer. `explicit` must exist when
    /// given; the user and project files are optional.
    pub fn load(cwd: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config) = user_config_path()
            && user_config.is_file()
        {
            debug!("Loading user config {}", user_config.display());
            config.apply(ConfigOverrides::from_file(&user_config)?);
        }

        let project_config = cwd.join(CONFIG_FILE_NAME);
        if project_config.is_file() {
            debug!("Loading project config {}", project_config.display());
            config.apply(ConfigOverrides::from_file(&project_config)?);
        }

        if let Some(explicit) = explicit {
            let explicit = if explicit.is_absolute() {
                explicit.to_path_buf()
            } else {
                cwd.join(explicit)
            };
            if !explicit.is_file() {
                bail!("Config file {} does not exist", explicit.display());
            }
            debug!("Loading config {}", explicit.display());
            config.apply(ConfigOverrides::from_file(&explicit)?);
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Overlay every field set in `overrides`
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            entry,
            outdir,
            file_name,
            clean,
            project,
        } = overrides;
        if entry.is_some() {
            self.entry = entry;
        }
        if let Some(outdir) = outdir {
            self.outdir = outdir;
        }
        if let Some(file_name) = file_name {
            self.file_name = file_name;
        }
        if let Some(clean) = clean {
            self.clean = clean;
        }
        if project.is_some() {
            self.project = project;
        }
    }

    /// Overlay `EXTRACT_TYPINGS_ENTRY`, `_OUTDIR`, `_FILE_NAME`, `_CLEAN` and
    /// `_PROJECT`
    pub fn apply_env(&mut self) -> Result<()> {
        let var = |name: &str| env::var_os(format!("{ENV_PREFIX}{name}"));
        let clean = match env::var(format!("{ENV_PREFIX}CLEAN")) {
            Ok(value) => Some(parse_bool(&value).with_context(|| {
                format!("Invalid value for {ENV_PREFIX}CLEAN: '{value}'")
            })?),
            Err(_) => None,
        };
        self.apply(ConfigOverrides {
            entry: var("ENTRY").map(PathBuf::from),
            outdir: var("OUTDIR").map(PathBuf::from),
            file_name: var("FILE_NAME").map(|name| name.to_string_lossy().into_owned()),
            clean,
            project: var("PROJECT").map(PathBuf::from),
        });
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}

/// `<config dir>/extract-typings/extract-typings.toml`, when a home
/// directory can be determined
pub fn user_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(
        strategy
            .config_dir()
            .join("extract-typings")
            .join(CONFIG_FILE_NAME),
    )
}
