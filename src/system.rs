//! System-wide reconfiguration through the alternatives registry.
//!
//! Every step is idempotent on its own and nothing is rolled back: when a
//! later step fails the earlier ones stay applied and are listed in the log.

use crate::command::{CommandRunner, Invocation, run_checked};
use crate::config::{Config, Target};
use crate::env::Environment;
use crate::error::{Result, SwitchError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// How privileged commands are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privileges {
    /// Effective user is root; commands run as-is.
    Root,
    /// Commands run through non-interactive sudo.
    Sudo(PathBuf),
    Unprivileged,
}

impl Privileges {
    /// Inspect the effective user and the search path of `env`.
    pub fn detect(env: &Environment) -> Self {
        if is_root() {
            return Privileges::Root;
        }
        match env.search_path().locate("sudo") {
            Ok(sudo) => Privileges::Sudo(sudo),
            Err(_) => Privileges::Unprivileged,
        }
    }

    fn wrapper(&self) -> Vec<OsString> {
        match self {
            Privileges::Sudo(sudo) => vec![sudo.clone().into_os_string(), "-n".into()],
            _ => Vec::new(),
        }
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// Steps applied by [`reconfigure_system`], in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemReport {
    pub completed: Vec<String>,
}

const PERMISSION_MESSAGES: &[&str] = &[
    "permission denied",
    "password is required",
    "operation not permitted",
    "must be root",
    "not in the sudoers",
    "may not run sudo",
    "a terminal is required",
];

fn is_permission_failure(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    PERMISSION_MESSAGES.iter().any(|needle| lower.contains(needle))
}

/// Register the target as the preferred interpreter for all users and point
/// the package-manager symlink at its pip.
pub fn reconfigure_system(
    config: &Config,
    target: &Target,
    env: &Environment,
    runner: &dyn CommandRunner,
    privileges: &Privileges,
) -> Result<SystemReport> {
    let search = env.search_path();
    let alternate = search.locate(&target.executable)?;
    if *privileges == Privileges::Unprivileged {
        return Err(SwitchError::PermissionDenied {
            operation: "system reconfiguration".to_string(),
            detail: "not running as root and sudo is not available".to_string(),
        });
    }
    let wrapper = privileges.wrapper();
    let mut report = SystemReport::default();

    match apply_steps(config, target, env, runner, &alternate, &wrapper, &mut report) {
        Ok(()) => Ok(report),
        Err(err) => {
            if !report.completed.is_empty() {
                tracing::warn!(
                    completed = ?report.completed,
                    "system reconfiguration stopped part way; completed steps were not rolled back"
                );
            }
            Err(err)
        }
    }
}

fn apply_steps(
    config: &Config,
    target: &Target,
    env: &Environment,
    runner: &dyn CommandRunner,
    alternate: &Path,
    wrapper: &[OsString],
    report: &mut SystemReport,
) -> Result<()> {
    let search = env.search_path();
    let alternatives = search.locate("update-alternatives")?;
    privileged(
        runner,
        Invocation::new(alternatives)
            .arg("--install")
            .arg(&config.python_link)
            .arg(config.alternative_name())
            .arg(alternate)
            .arg(config.alt_priority.to_string()),
        wrapper,
        env,
        report,
    )?;

    let alt_dir = alternate.parent().unwrap_or_else(|| Path::new("/"));
    let pip_search = search.prepended(alt_dir);
    let pip = match pip_search.locate(&target.pip_name()) {
        Ok(pip) => pip,
        Err(_) => {
            tracing::info!(pip = %target.pip_name(), "package manager missing, bootstrapping");
            privileged(
                runner,
                Invocation::new(alternate).args(["-m", "ensurepip", "--upgrade"]),
                wrapper,
                env,
                report,
            )?;
            pip_search.locate(&target.pip_name())?
        }
    };

    let ln = search.locate("ln")?;
    privileged(
        runner,
        Invocation::new(ln).arg("-sf").arg(&pip).arg(&config.pip_link),
        wrapper,
        env,
        report,
    )
}

fn privileged(
    runner: &dyn CommandRunner,
    invocation: Invocation,
    wrapper: &[OsString],
    env: &Environment,
    report: &mut SystemReport,
) -> Result<()> {
    let shown = invocation.to_string();
    // sudo itself refusing shows up as a failure of the first wrapped step
    let first_elevated = !wrapper.is_empty() && report.completed.is_empty();
    match run_checked(runner, &invocation.wrapped(wrapper), env) {
        Ok(_) => {
            report.completed.push(shown);
            Ok(())
        }
        Err(SwitchError::CommandFailed { stderr, .. })
            if first_elevated || is_permission_failure(&stderr) =>
        {
            Err(SwitchError::PermissionDenied {
                operation: shown,
                detail: stderr,
            })
        }
        Err(err) => Err(err),
    }
}
