//! Filesystem and formatting helpers shared by the bundler and the CLI.

use std::{
    fs,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use cow_utils::CowUtils;
use log::debug;

/// Recursively delete `path`. Missing paths are not an error.
pub fn clean_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    debug!("Cleaning output directory {}", path.display());
    if path.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory {}", path.display()))
    } else {
        fs::remove_file(path).with_context(|| format!("Failed to remove file {}", path.display()))
    }
}

/// Create `path` and all of its missing parents.
pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))
}

/// Lexically normalize a path: `.` segments are dropped and `..` pops the
/// previous normal segment. Symlinks are not followed.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Make `path` absolute against `base` and normalize it.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Path of `path` relative to `base` with forward slashes, for log output.
pub fn display_path(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .to_string_lossy()
        .cow_replace('\\', "/")
        .into_owned()
}

/// Human-readable elapsed time: `850ms`, `1.50s`, `2m 5s`, `1h 2m 3s`.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1_000 {
        return format!("{millis}ms");
    }
    if millis < 60_000 {
        return format!("{:.2}s", duration.as_secs_f64());
    }
    let total_secs = duration.as_secs();
    if millis < 3_600_000 {
        return format!("{}m {}s", total_secs / 60, total_secs % 60);
    }
    format!(
        "{}h {}m {}s",
        total_secs / 3_600,
        (total_secs % 3_600) / 60,
        total_secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_boundaries() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1_000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(1_500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3_723)), "1h 2m 3s");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/./c/../d")),
            PathBuf::from("/a/b/d")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize_path(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_display_path_is_relative() {
        let base = Path::new("/project");
        assert_eq!(
            display_path(Path::new("/project/src/index.ts"), base),
            "src/index.ts"
        );
        assert_eq!(display_path(Path::new("/elsewhere/a.ts"), base), "/elsewhere/a.ts");
    }

    #[test]
    fn test_clean_directory_missing_is_ok() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("nope");
        assert!(clean_directory(&missing).is_ok());

        let nested = temp.path().join("out/deep");
        ensure_directory(&nested).expect("create");
        fs::write(nested.join("a.d.ts"), "").expect("write");
        clean_directory(&temp.path().join("out")).expect("clean");
        assert!(!temp.path().join("out").exists());
    }
}
