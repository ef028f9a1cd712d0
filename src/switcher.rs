//! Search-path activation and restoration.

use crate::config::Target;
use crate::env::{Environment, PATH_VAR};
use crate::error::{Result, SwitchError};
use crate::search_path::SearchPath;
use std::path::{Path, PathBuf};

/// Backup of the search path as it was before the first activation.
pub const OLD_PATH_VAR: &str = "PYSWITCH_OLD_PATH";
/// Version markers read by launchers that select an interpreter by version.
pub const VERSION_MARKERS: [&str; 2] = ["PY_PYTHON", "PYTHON_VERSION"];
pub const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";
pub const PYTHONHOME_VAR: &str = "PYTHONHOME";

/// Variables an activation may overwrite or unset. Values present before the
/// first activation are kept under [`SAVED_PREFIX`] and put back by [`restore`].
const TOUCHED_VARS: [&str; 4] = ["PY_PYTHON", "PYTHON_VERSION", VIRTUAL_ENV_VAR, PYTHONHOME_VAR];
pub const SAVED_PREFIX: &str = "PYSWITCH_SAVED_";

fn saved_name(var: &str) -> String {
    format!("{SAVED_PREFIX}{var}")
}

/// Outcome of a successful activation.
#[derive(Debug, Clone)]
pub struct Activation {
    /// The environment to hand to the host.
    pub env: Environment,
    /// Interpreter that the switched environment resolves to.
    pub interpreter: PathBuf,
    /// Search path before this activation.
    pub original: SearchPath,
}

/// Switch `env` to the target interpreter found on its own search path.
///
/// Fails with `NotFound` before computing anything when the target is
/// missing; `env` itself is never modified.
pub fn activate(target: &Target, env: &Environment) -> Result<Activation> {
    let original = env.search_path();
    let interpreter = original.locate(&target.executable)?;
    let dir = interpreter.parent().unwrap_or_else(|| Path::new("/"));
    let switched = activate_dir(dir, target, env)?;
    tracing::info!(
        interpreter = %interpreter.display(),
        version = %target.version,
        "switched search path"
    );
    Ok(Activation {
        env: switched,
        interpreter,
        original,
    })
}

/// Prepend `dir` to the search path, back up the old value and set the
/// version markers.
///
/// An existing backup is kept, so a chain of activations still restores to
/// the state before the first one.
pub(crate) fn activate_dir(dir: &Path, target: &Target, env: &Environment) -> Result<Environment> {
    let mut next = env.clone();
    next.set_search_path(&env.search_path().prepended(dir))?;
    if env.get_var(OLD_PATH_VAR).is_none() {
        next.set_var(OLD_PATH_VAR, env.get_var(PATH_VAR).unwrap_or_default());
        for var in TOUCHED_VARS {
            if let Some(value) = env.get_var(var) {
                next.set_var(saved_name(var), value);
            }
        }
    }
    for marker in VERSION_MARKERS {
        next.set_var(marker, target.version.as_str());
    }
    Ok(next)
}

/// Point `<dir>/<name>` at the target interpreter and activate `dir`.
///
/// Needs no elevated privileges: `dir` is a user-writable directory such as
/// `~/local/bin`. An existing file or link at that name is replaced.
pub fn link(target: &Target, dir: &Path, name: &str, env: &Environment) -> Result<Activation> {
    let original = env.search_path();
    let interpreter = original.locate(&target.executable)?;
    std::fs::create_dir_all(dir)
        .map_err(|e| SwitchError::io(format!("cannot create {}", dir.display()), e))?;

    let link_path = dir.join(name);
    if link_path.symlink_metadata().is_ok() {
        std::fs::remove_file(&link_path)
            .map_err(|e| SwitchError::io(format!("cannot replace {}", link_path.display()), e))?;
    }
    symlink(&interpreter, &link_path)
        .map_err(|e| SwitchError::io(format!("cannot link {}", link_path.display()), e))?;
    tracing::info!(
        link = %link_path.display(),
        interpreter = %interpreter.display(),
        "created interpreter link"
    );

    Ok(Activation {
        env: activate_dir(dir, target, env)?,
        interpreter: link_path,
        original,
    })
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Undo an activation: put the backed-up search path back, give the other
/// touched variables their pre-activation values and drop the ones the
/// switcher introduced. Returns `None` when nothing was active.
pub fn restore(env: &Environment) -> Option<Environment> {
    let backup = env.get_var(OLD_PATH_VAR)?;
    let mut next = env.clone();
    if backup.is_empty() {
        next.remove_var(PATH_VAR);
    } else {
        next.set_var(PATH_VAR, backup);
    }
    next.remove_var(OLD_PATH_VAR);
    for var in TOUCHED_VARS {
        match next.remove_var(&saved_name(var)) {
            Some(value) => next.set_var(var, value),
            // PYTHONHOME is only ever unset, so one set later belongs to the user
            None if var == PYTHONHOME_VAR => {}
            None => {
                next.remove_var(var);
            }
        }
    }
    tracing::info!("restored original search path");
    Some(next)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::search_path::tests::touch_executable;
    use std::path::PathBuf;

    fn target() -> Target {
        Target::new("python3.12", "3.12")
    }

    #[test]
    fn missing_target_is_not_found_and_env_untouched() {
        let env = Environment::with_path("/usr/bin");
        let before = env.clone();
        match activate(&target(), &env) {
            Err(SwitchError::NotFound { name, .. }) => assert_eq!(name, "python3.12"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(env, before);
        assert_eq!(env.search_path().entries(), &[PathBuf::from("/usr/bin")]);
    }

    #[test]
    fn alternate_dir_moves_to_front_and_order_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let usr_bin = tmp.path().join("usr/bin");
        let alt = tmp.path().join("opt/alt312/bin");
        std::fs::create_dir_all(&usr_bin).unwrap();
        touch_executable(&alt.join("python3.12"));

        let raw = std::env::join_paths([&usr_bin, &alt]).unwrap();
        let env = Environment::with_path(raw.to_str().unwrap());
        let activation = activate(&target(), &env).unwrap();

        assert_eq!(activation.interpreter, alt.join("python3.12"));
        assert_eq!(
            activation.env.search_path().entries(),
            &[alt.clone(), usr_bin.clone(), alt.clone()]
        );
        assert_eq!(activation.original, env.search_path());
        assert_eq!(activation.env.get_var("PY_PYTHON"), Some("3.12"));
        assert_eq!(activation.env.get_var("PYTHON_VERSION"), Some("3.12"));
        assert_eq!(activation.env.get_var(OLD_PATH_VAR), Some(raw.to_str().unwrap()));
    }

    #[test]
    fn restore_returns_original_search_path() {
        let tmp = tempfile::tempdir().unwrap();
        let alt = tmp.path().join("alt/bin");
        touch_executable(&alt.join("python3.12"));
        let raw = format!("/usr/local/bin:/usr/bin:{}", alt.display());
        let env = Environment::with_path(&raw);

        let first = activate(&target(), &env).unwrap();
        let second = activate(&target(), &first.env).unwrap();
        assert_eq!(second.env.get_var(OLD_PATH_VAR), Some(raw.as_str()));

        let restored = restore(&second.env).expect("activation should be restorable");
        assert_eq!(restored.search_path(), env.search_path());
        assert_eq!(restored, env);
    }

    #[test]
    fn restore_brings_back_values_set_before_activation() {
        let tmp = tempfile::tempdir().unwrap();
        let alt = tmp.path().join("alt/bin");
        touch_executable(&alt.join("python3.12"));
        let mut env = Environment::with_path(&format!("/usr/bin:{}", alt.display()));
        env.set_var("PY_PYTHON", "3.6");
        env.set_var(VIRTUAL_ENV_VAR, "/home/cdsw/.venv");
        env.set_var(PYTHONHOME_VAR, "/usr");

        let first = activate(&target(), &env).unwrap();
        let mut switched = activate(&target(), &first.env).unwrap().env;
        switched.remove_var(PYTHONHOME_VAR);
        assert_eq!(switched.get_var("PY_PYTHON"), Some("3.12"));

        let restored = restore(&switched).unwrap();
        assert_eq!(restored, env);
    }

    #[test]
    fn link_replaces_existing_entry_and_activates_its_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let alt = tmp.path().join("opt/alt312/bin");
        touch_executable(&alt.join("python3.12"));
        let local_bin = tmp.path().join("home/local/bin");
        std::fs::create_dir_all(&local_bin).unwrap();
        std::fs::write(local_bin.join("python3"), b"stale").unwrap();
        let env = Environment::with_path(&format!("/usr/bin:{}", alt.display()));

        let activation = link(&target(), &local_bin, "python3", &env).unwrap();

        let link_path = local_bin.join("python3");
        assert_eq!(activation.interpreter, link_path);
        assert_eq!(std::fs::read_link(&link_path).unwrap(), alt.join("python3.12"));
        assert_eq!(activation.env.search_path().position(&local_bin), Some(0));
        assert_eq!(activation.env.search_path().locate("python3").unwrap(), link_path);
        assert_eq!(activation.env.get_var("PYTHON_VERSION"), Some("3.12"));

        let again = link(&target(), &local_bin, "python3", &env).unwrap();
        assert_eq!(std::fs::read_link(&again.interpreter).unwrap(), alt.join("python3.12"));
    }

    #[test]
    fn link_without_target_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let local_bin = tmp.path().join("local/bin");
        let err = link(&target(), &local_bin, "python3", &Environment::with_path("/nonexistent"))
            .unwrap_err();
        assert!(matches!(err, SwitchError::NotFound { .. }));
        assert!(!local_bin.exists());
    }

    #[test]
    fn restore_without_backup_is_none() {
        assert!(restore(&Environment::with_path("/usr/bin")).is_none());
    }
}
