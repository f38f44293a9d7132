//! Filesystem helpers for the output tree.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::error::{FigmintError, Result};

/// Remove `dir` (if present) and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(FigmintError::filesystem(dir, err)),
    }
    ensure_dir(dir)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| FigmintError::filesystem(dir, err))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `contents` to `path` unless the file already holds exactly that.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome> {
    match std::fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => return Ok(WriteOutcome::Unchanged),
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(FigmintError::filesystem(path, err)),
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    std::fs::write(path, contents).map_err(|err| FigmintError::filesystem(path, err))?;
    Ok(WriteOutcome::Written)
}

/// Turn a node name such as `icons/arrow` into a relative path that cannot
/// escape its base directory. Empty, `.` and `..` segments are dropped.
pub fn sanitize_relative(name: &str) -> PathBuf {
    name.split(['/', '\\'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            matches!(
                Path::new(segment).components().next(),
                Some(Component::Normal(_))
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reset_dir_clears_previous_contents() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("exports");
        std::fs::create_dir_all(target.join("old")).expect("mkdir");
        std::fs::write(target.join("old/file.png"), b"x").expect("write");

        reset_dir(&target).expect("reset");
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).expect("read").count(), 0);
    }

    #[test]
    fn reset_dir_creates_missing_directory() {
        let dir = TempDir::new().expect("tempdir");
        let target = dir.path().join("a/b/c");
        reset_dir(&target).expect("reset");
        assert!(target.is_dir());
    }

    #[test]
    fn write_if_changed_skips_identical_content() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested/index.js");
        assert_eq!(write_if_changed(&path, "a").expect("write"), WriteOutcome::Written);
        assert_eq!(write_if_changed(&path, "a").expect("write"), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, "b").expect("write"), WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "b");
    }

    #[test]
    fn sanitize_relative_drops_traversal() {
        assert_eq!(sanitize_relative("icons/arrow"), PathBuf::from("icons/arrow"));
        assert_eq!(sanitize_relative("../../etc/passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(sanitize_relative("a//./b"), PathBuf::from("a/b"));
        assert_eq!(sanitize_relative(".."), PathBuf::new());
    }
}
