//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read file contents with standardized error handling.
///
/// Wraps `fs::read_to_string` with consistent `Error::internal_io` formatting.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} {}", operation, path.display()))))
}

/// Create `path` and its parents if missing.
pub fn ensure_dir(path: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} {}", operation, path.display()))))
}

/// Delete `path` and everything below it. A missing directory is not an error.
pub fn remove_dir(path: &Path, operation: &str) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::internal_io(
            e.to_string(),
            Some(format!("{} {}", operation, path.display())),
        )),
    }
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path, operation: &str) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent, operation)?;
    }
    fs::copy(from, to).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("{} {} -> {}", operation, from.display(), to.display())),
        )
    })?;
    Ok(())
}

/// Regular files under `root` whose extension is `extension`, sorted.
///
/// A missing root yields an empty list.
pub fn find_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        extension
    );
    let entries = glob::glob(&pattern).map_err(|e| {
        Error::internal_unexpected(format!("Invalid glob pattern '{}': {}", pattern, e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("scan {}", root.display())))
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "test content").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("test content"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let result = read_file(Path::new("/nonexistent/path.txt"), "test read");
        let err = result.unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn copy_file_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.js");
        fs::write(&from, "var a;").unwrap();
        let to = dir.path().join("out/nested/a.js");

        copy_file(&from, &to, "copy").unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "var a;");
    }

    #[test]
    fn remove_dir_clears_tree_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("web");
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib/a.js"), "").unwrap();

        remove_dir(&root, "clean").unwrap();
        assert!(!root.exists());
        remove_dir(&root, "clean").unwrap();
    }

    #[test]
    fn find_files_walks_nested_directories_in_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib/util")).unwrap();
        fs::write(dir.path().join("main.js"), "").unwrap();
        fs::write(dir.path().join("lib/util/b.js"), "").unwrap();
        fs::write(dir.path().join("lib/a.js"), "").unwrap();
        fs::write(dir.path().join("lib/readme.md"), "").unwrap();

        let files = find_files(dir.path(), "js").unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("lib/a.js"),
                PathBuf::from("lib/util/b.js"),
                PathBuf::from("main.js"),
            ]
        );
    }

    #[test]
    fn find_files_in_missing_root_is_empty() {
        let files = find_files(Path::new("/nonexistent/js"), "js").unwrap();
        assert!(files.is_empty());
    }
}
