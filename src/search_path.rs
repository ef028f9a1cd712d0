use crate::error::{Result, SwitchError};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Ordered list of directories consulted to resolve an executable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath(Vec<PathBuf>);

impl SearchPath {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self(entries)
    }

    /// Split a raw `PATH` value using the platform separator.
    pub fn parse(raw: &OsStr) -> Self {
        Self(std::env::split_paths(raw).collect())
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.0
    }

    pub fn position(&self, dir: &Path) -> Option<usize> {
        self.0.iter().position(|entry| entry == dir)
    }

    /// New search path with `dir` in front. Existing entries, including any
    /// earlier occurrence of `dir`, keep their relative order.
    pub fn prepended(&self, dir: &Path) -> SearchPath {
        let mut entries = Vec::with_capacity(self.0.len() + 1);
        entries.push(dir.to_path_buf());
        entries.extend(self.0.iter().cloned());
        SearchPath(entries)
    }

    pub fn join(&self) -> Result<OsString> {
        Ok(std::env::join_paths(&self.0)?)
    }

    /// Resolve `name` to an executable file, or fail with `NotFound`.
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        match find_command_path(self, Path::new(name)) {
            Some(found) => {
                tracing::debug!(name, path = %found.display(), "resolved executable");
                Ok(found.into_owned())
            }
            None => Err(SwitchError::NotFound {
                name: name.to_string(),
                searched: self.0.clone(),
            }),
        }
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_path`
///   and return the first executable match.
/// - Relative with multiple components (e.g., `bin/python`): returns it if it exists.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_path: &SearchPath, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && is_executable(path) {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_path, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_path: &SearchPath, cmd: &OsStr) -> Option<PathBuf> {
    search_path
        .entries()
        .iter()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
