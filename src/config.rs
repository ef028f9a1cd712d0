//! Switcher configuration.
//!
//! Values come from `PYSWITCH_*` variables of an explicit [`Environment`]
//! (empty values count as unset), then built-in defaults. Command-line flags
//! are layered on top by the binary.

use crate::env::Environment;
use crate::error::{Result, SwitchError};
use crate::version::marker_from_name;
use std::path::PathBuf;

pub mod keys {
    pub const TARGET: &str = "PYSWITCH_TARGET";
    pub const VERSION: &str = "PYSWITCH_VERSION";
    pub const VENV_DIR: &str = "PYSWITCH_VENV_DIR";
    pub const PACKAGES: &str = "PYSWITCH_PACKAGES";
    pub const ALT_PRIORITY: &str = "PYSWITCH_ALT_PRIORITY";
    pub const PYTHON_LINK: &str = "PYSWITCH_PYTHON_LINK";
    pub const PIP_LINK: &str = "PYSWITCH_PIP_LINK";
    pub const SCRIPT: &str = "PYSWITCH_SCRIPT";
    pub const LINK_DIR: &str = "PYSWITCH_LINK_DIR";
    pub const LOG_LEVEL: &str = "PYSWITCH_LOG_LEVEL";
    pub const QUIET: &str = "PYSWITCH_QUIET";
}

pub const DEFAULT_TARGET: &str = "python3.12";
pub const DEFAULT_ALT_PRIORITY: u32 = 100;

/// Data-science set installed into a freshly created isolated environment.
pub const DEFAULT_PACKAGES: &[&str] = &[
    "numpy",
    "pandas",
    "matplotlib",
    "seaborn",
    "scikit-learn",
    "jupyter",
    "ipykernel",
    "requests",
    "pillow",
];

/// The executable to switch to and the version marker exported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub executable: String,
    pub version: String,
}

impl Target {
    pub fn new(executable: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            version: version.into(),
        }
    }

    /// Derive the version marker from the executable name.
    pub fn from_executable(executable: &str) -> Result<Self> {
        let version = marker_from_name(executable).ok_or_else(|| SwitchError::InvalidTarget {
            name: executable.to_string(),
        })?;
        Ok(Self::new(executable, version))
    }

    /// Marker without dots, `3.12` -> `312`.
    pub fn compact_version(&self) -> String {
        self.version.replace('.', "")
    }

    /// Versioned package-manager front end, e.g. `pip3.12`.
    pub fn pip_name(&self) -> String {
        format!("pip{}", self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub target: String,
    pub version: Option<String>,
    pub venv_dir: Option<PathBuf>,
    pub packages: Vec<String>,
    pub alt_priority: u32,
    pub python_link: PathBuf,
    pub pip_link: PathBuf,
    pub script_path: Option<PathBuf>,
    pub link_dir: Option<PathBuf>,
    pub home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            version: None,
            venv_dir: None,
            packages: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
            alt_priority: DEFAULT_ALT_PRIORITY,
            python_link: PathBuf::from("/usr/bin/python3"),
            pip_link: PathBuf::from("/usr/bin/pip3"),
            script_path: None,
            link_dir: None,
            home: PathBuf::from("."),
        }
    }
}

fn env_optional(env: &Environment, key: &str) -> Option<String> {
    env.get_var(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Split a package list on commas and whitespace.
pub fn parse_packages(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env(env: &Environment) -> Self {
        let defaults = Config::default();
        let alt_priority = match env_optional(env, keys::ALT_PRIORITY) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "ignoring invalid {}", keys::ALT_PRIORITY);
                defaults.alt_priority
            }),
            None => defaults.alt_priority,
        };
        Self {
            target: env_optional(env, keys::TARGET).unwrap_or(defaults.target),
            version: env_optional(env, keys::VERSION),
            venv_dir: env_optional(env, keys::VENV_DIR).map(PathBuf::from),
            packages: env_optional(env, keys::PACKAGES)
                .map(|raw| parse_packages(&raw))
                .unwrap_or(defaults.packages),
            alt_priority,
            python_link: env_optional(env, keys::PYTHON_LINK)
                .map(PathBuf::from)
                .unwrap_or(defaults.python_link),
            pip_link: env_optional(env, keys::PIP_LINK)
                .map(PathBuf::from)
                .unwrap_or(defaults.pip_link),
            script_path: env_optional(env, keys::SCRIPT).map(PathBuf::from),
            link_dir: env_optional(env, keys::LINK_DIR).map(PathBuf::from),
            home: env.home_dir(),
        }
    }

    pub fn target(&self) -> Result<Target> {
        let printable = |v: &str| !v.is_empty() && !v.chars().any(char::is_control);
        if !printable(&self.target) || self.version.as_deref().is_some_and(|v| !printable(v)) {
            return Err(SwitchError::InvalidTarget {
                name: self.target.clone(),
            });
        }
        match &self.version {
            Some(version) => Ok(Target::new(&self.target, version)),
            None => Target::from_executable(&self.target),
        }
    }

    /// `~/venvs/py312` unless configured.
    pub fn venv_dir(&self, target: &Target) -> PathBuf {
        self.venv_dir.clone().unwrap_or_else(|| {
            self.home
                .join("venvs")
                .join(format!("py{}", target.compact_version()))
        })
    }

    /// `~/switch_to_python312.sh` unless configured.
    pub fn script_path(&self, target: &Target) -> PathBuf {
        self.script_path.clone().unwrap_or_else(|| {
            self.home
                .join(format!("switch_to_python{}.sh", target.compact_version()))
        })
    }

    /// `~/local/bin` unless configured.
    pub fn link_dir(&self) -> PathBuf {
        self.link_dir
            .clone()
            .unwrap_or_else(|| self.home.join("local").join("bin"))
    }

    /// `~/.bashrc_python312`, written next to the switch script.
    pub fn alias_path(&self, target: &Target) -> PathBuf {
        self.home
            .join(format!(".bashrc_python{}", target.compact_version()))
    }

    /// Generic command name registered with the alternatives system.
    pub fn alternative_name(&self) -> String {
        self.python_link
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "python3".to_string())
    }
}
