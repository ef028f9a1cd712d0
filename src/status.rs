use crate::command::CommandRunner;
use crate::config::{Config, Target};
use crate::env::Environment;
use crate::switcher::{VERSION_MARKERS, VIRTUAL_ENV_VAR};
use crate::version::{InterpreterVersion, probe_version};
use std::fmt;
use std::path::{Path, PathBuf};

/// What an interpreter name currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<InterpreterVersion>,
}

impl Resolved {
    fn probe(name: &str, env: &Environment, runner: &dyn CommandRunner) -> Self {
        let path = env.search_path().locate(name).ok();
        let version = path.as_deref().and_then(|p| match probe_version(runner, p, env) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(error = %e, "version probe failed");
                None
            }
        });
        Self {
            name: name.to_string(),
            path,
            version,
        }
    }
}

/// Read-only snapshot of the switch state of an environment.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub target: Target,
    pub default_python: Resolved,
    pub alternate: Resolved,
    pub virtual_env: Option<String>,
    pub markers: Vec<(String, Option<String>)>,
    /// Search-path entries inside the configured isolated environment.
    pub isolated_entries: Vec<PathBuf>,
}

impl StatusReport {
    /// True when plain `python3` already resolves to the target version.
    pub fn switched(&self) -> bool {
        self.default_python
            .version
            .is_some_and(|v| v.satisfies(&self.target.version))
    }
}

pub fn status(
    config: &Config,
    target: &Target,
    env: &Environment,
    runner: &dyn CommandRunner,
) -> StatusReport {
    let venv_root = config.venv_dir(target);
    StatusReport {
        target: target.clone(),
        default_python: Resolved::probe("python3", env, runner),
        alternate: Resolved::probe(&target.executable, env, runner),
        virtual_env: env.get_var(VIRTUAL_ENV_VAR).map(str::to_string),
        markers: VERSION_MARKERS
            .iter()
            .map(|m| (m.to_string(), env.get_var(m).map(str::to_string)))
            .collect(),
        isolated_entries: env
            .search_path()
            .entries()
            .iter()
            .filter(|e| e.starts_with(&venv_root))
            .cloned()
            .collect(),
    }
}

fn show_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "not found".to_string(), |p| p.display().to_string())
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, show_path(self.path.as_deref()))?;
        if let Some(v) = &self.version {
            write!(f, " (Python {})", v)?;
        }
        Ok(())
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.default_python)?;
        writeln!(f, "{}", self.alternate)?;
        let state = if self.switched() { "" } else { "not " };
        writeln!(f, "python3 is {}on {} or newer", state, self.target.version)?;
        writeln!(
            f,
            "{}: {}",
            VIRTUAL_ENV_VAR,
            self.virtual_env.as_deref().unwrap_or("not set")
        )?;
        for (name, value) in &self.markers {
            writeln!(f, "{}: {}", name, value.as_deref().unwrap_or("not set"))?;
        }
        if self.isolated_entries.is_empty() {
            writeln!(f, "isolated environment: not on search path")?;
        } else {
            for entry in &self.isolated_entries {
                writeln!(f, "isolated environment: {}", entry.display())?;
            }
        }
        Ok(())
    }
}
