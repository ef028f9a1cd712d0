use crate::error::Result;
use crate::search_path::SearchPath;
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Name of the variable holding the executable search path.
pub const PATH_VAR: &str = "PATH";

/// Explicit snapshot of a process environment.
///
/// Switching operations take an `Environment` by reference and hand back a new
/// one, so the real process environment is only touched at the command boundary
/// (printing export lines or spawning a child).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// Working directory for spawned commands.
    pub current_dir: PathBuf,
    /// Variables whose name or value is not UTF-8. Never switched, only
    /// handed on to children unchanged.
    pub opaque: Vec<(OsString, OsString)>,
}

/// A single difference between two environments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvChange {
    Set { name: String, value: String },
    Unset { name: String },
}

impl Environment {
    /// Capture the current process state.
    pub fn from_process() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_vars_os(stdenv::vars_os(), current_dir)
    }

    /// Build from raw pairs. Non-UTF-8 pairs land in [`Environment::opaque`].
    pub fn from_vars_os(
        pairs: impl IntoIterator<Item = (OsString, OsString)>,
        current_dir: PathBuf,
    ) -> Self {
        let mut vars = HashMap::new();
        let mut opaque = Vec::new();
        for (k, v) in pairs {
            match (k.into_string(), v.into_string()) {
                (Ok(k), Ok(v)) => {
                    vars.insert(k, v);
                }
                (k, v) => opaque.push((
                    k.map_or_else(|raw| raw, OsString::from),
                    v.map_or_else(|raw| raw, OsString::from),
                )),
            }
        }
        Self {
            vars,
            current_dir,
            opaque,
        }
    }

    /// Environment holding only the given search path.
    pub fn with_path(path: &str) -> Self {
        let mut vars = HashMap::new();
        vars.insert(PATH_VAR.to_string(), path.to_string());
        Self {
            vars,
            current_dir: PathBuf::from("."),
            opaque: Vec::new(),
        }
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn remove_var(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Parsed view of `PATH`; empty when unset.
    pub fn search_path(&self) -> SearchPath {
        match self.get_var(PATH_VAR) {
            Some(raw) => SearchPath::parse(OsStr::new(raw)),
            None => SearchPath::default(),
        }
    }

    /// Replace `PATH` with the joined form of `search_path`.
    pub fn set_search_path(&mut self, search_path: &SearchPath) -> Result<()> {
        let joined = search_path.join()?;
        self.set_var(PATH_VAR, joined.to_string_lossy().into_owned());
        Ok(())
    }

    /// Home directory: `$HOME` from this environment, then the platform default.
    pub fn home_dir(&self) -> PathBuf {
        self.get_var("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Changes that turn `self` into `after`, sorted by variable name.
    pub fn diff(&self, after: &Environment) -> Vec<EnvChange> {
        let mut changes: Vec<EnvChange> = after
            .vars
            .iter()
            .filter(|(k, v)| self.vars.get(*k) != Some(*v))
            .map(|(k, v)| EnvChange::Set {
                name: k.clone(),
                value: v.clone(),
            })
            .chain(
                self.vars
                    .keys()
                    .filter(|k| !after.vars.contains_key(*k))
                    .map(|k| EnvChange::Unset { name: k.clone() }),
            )
            .collect();
        changes.sort_by(|a, b| a.name().cmp(b.name()));
        changes
    }
}

impl EnvChange {
    pub fn name(&self) -> &str {
        match self {
            EnvChange::Set { name, .. } | EnvChange::Unset { name } => name,
        }
    }
}
