//! Executable discovery on the system search path.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Name variants tried for every tool, in lookup order.
///
/// Windows launchers first, then Unix shell scripts. All variants are checked on
/// every platform so resolution is identical everywhere.
pub const CANDIDATE_SUFFIXES: [&str; 6] = ["", ".exe", ".bat", ".cmd", ".sh", ".bash"];

/// An executable file that existed when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExecutable(PathBuf);

impl ResolvedExecutable {
    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl std::fmt::Display for ResolvedExecutable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchPath {
    Env,
    Fixed(Option<OsString>),
}

/// Resolves logical tool names against a search path.
///
/// Nothing is cached: every call to [`ExecutableLocator::resolve`] reads the
/// search path and checks the filesystem again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableLocator {
    search_path: SearchPath,
}

impl Default for ExecutableLocator {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ExecutableLocator {
    /// Locator reading `PATH` at every resolution.
    pub fn from_env() -> Self {
        Self {
            search_path: SearchPath::Env,
        }
    }

    /// Locator using a fixed search path value. `None` behaves like an unset `PATH`.
    pub fn with_search_path(search_path: Option<impl Into<OsString>>) -> Self {
        Self {
            search_path: SearchPath::Fixed(search_path.map(Into::into)),
        }
    }

    pub fn resolve(&self, tool: &str) -> Option<ResolvedExecutable> {
        match &self.search_path {
            SearchPath::Env => find_in_search_path(tool, env::var_os("PATH").as_deref()),
            SearchPath::Fixed(value) => find_in_search_path(tool, value.as_deref()),
        }
    }
}

/// File names checked for `tool`, in order.
pub fn candidates(tool: &str) -> Vec<String> {
    CANDIDATE_SUFFIXES
        .iter()
        .map(|suffix| format!("{}{}", tool, suffix))
        .collect()
}

pub fn find_in_search_path(tool: &str, search_path: Option<&OsStr>) -> Option<ResolvedExecutable> {
    find_in_search_path_with(tool, search_path, |path| path.is_file())
}

/// Check `(directory, candidate)` pairs in order and return the first accepted by `is_file`.
///
/// With no search path `is_file` is never called.
pub fn find_in_search_path_with<F>(
    tool: &str,
    search_path: Option<&OsStr>,
    mut is_file: F,
) -> Option<ResolvedExecutable>
where
    F: FnMut(&Path) -> bool,
{
    let search_path = search_path?;
    let names = candidates(tool);

    for dir in env::split_paths(search_path) {
        // An empty segment carries no directory; skip it rather than probing the cwd.
        if dir.as_os_str().is_empty() {
            continue;
        }
        for name in &names {
            let file = dir.join(name);
            if is_file(&file) {
                return Some(ResolvedExecutable(absolutize(file)));
            }
        }
    }

    None
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::path::absolute(&path).unwrap_or(path)
}
