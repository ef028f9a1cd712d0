//! Isolated environment provisioning.

use crate::command::{CommandRunner, Invocation, run_checked};
use crate::config::{Config, Target};
use crate::env::Environment;
use crate::error::Result;
use crate::switcher::{Activation, PYTHONHOME_VAR, VIRTUAL_ENV_VAR, activate_dir};
use std::path::{Path, PathBuf};

/// Tooling refreshed right after creation, before the package list.
const BOOTSTRAP_PACKAGES: [&str; 3] = ["pip", "setuptools", "wheel"];

/// A virtual environment rooted at a fixed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedEnv {
    root: PathBuf,
}

impl IsolatedEnv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn interpreter(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    pub fn pip(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("pip.exe")
        } else {
            self.bin_dir().join("pip")
        }
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Remove a partially built environment so the next run starts over.
    fn discard(&self) {
        if !self.root.exists() {
            return;
        }
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => tracing::warn!(root = %self.root.display(), "removed incomplete isolated environment"),
            Err(err) => tracing::warn!(
                root = %self.root.display(),
                error = %err,
                "could not remove incomplete isolated environment"
            ),
        }
    }

    /// Create the environment with `interpreter -m venv` and install packages.
    fn create(
        &self,
        interpreter: &Path,
        packages: &[String],
        env: &Environment,
        runner: &dyn CommandRunner,
    ) -> Result<()> {
        tracing::info!(root = %self.root.display(), "creating isolated environment");
        run_checked(
            runner,
            &Invocation::new(interpreter).args(["-m", "venv"]).arg(&self.root),
            env,
        )?;
        run_checked(
            runner,
            &Invocation::new(self.pip())
                .args(["install", "--upgrade"])
                .args(BOOTSTRAP_PACKAGES),
            env,
        )?;
        if packages.is_empty() {
            tracing::debug!("no packages configured");
        } else {
            run_checked(
                runner,
                &Invocation::new(self.pip()).arg("install").args(packages),
                env,
            )?;
        }
        Ok(())
    }
}

/// Result of [`provision`].
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub isolated: IsolatedEnv,
    /// False when the directory already existed and creation was skipped.
    pub created: bool,
    pub activation: Activation,
}

/// Ensure the isolated environment exists, then activate it.
///
/// The target interpreter must be resolvable even when the environment
/// already exists, so a missing runtime is always reported as `NotFound`.
pub fn provision(
    config: &Config,
    target: &Target,
    env: &Environment,
    runner: &dyn CommandRunner,
) -> Result<Provisioned> {
    let original = env.search_path();
    let base_interpreter = original.locate(&target.executable)?;
    let isolated = IsolatedEnv::new(config.venv_dir(target));

    let created = if isolated.exists() {
        tracing::info!(root = %isolated.root().display(), "isolated environment already present");
        if !isolated.interpreter().exists() {
            tracing::warn!(
                interpreter = %isolated.interpreter().display(),
                "isolated environment has no interpreter; remove the directory to recreate it"
            );
        }
        false
    } else {
        if let Err(err) = isolated.create(&base_interpreter, &config.packages, env, runner) {
            isolated.discard();
            return Err(err);
        }
        true
    };

    let mut switched = activate_dir(&isolated.bin_dir(), target, env)?;
    switched.set_var(VIRTUAL_ENV_VAR, isolated.root().to_string_lossy().into_owned());
    switched.remove_var(PYTHONHOME_VAR);

    Ok(Provisioned {
        activation: Activation {
            env: switched,
            interpreter: isolated.interpreter(),
            original,
        },
        isolated,
        created,
    })
}
