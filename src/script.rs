//! POSIX shell output: export lines for `eval` and the sourceable switch script.

use crate::config::Target;
use crate::env::EnvChange;
use crate::error::{Result, SwitchError};
use crate::switcher::{OLD_PATH_VAR, VERSION_MARKERS};
use std::fmt::Write as _;
use std::path::Path;

/// Quote `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-:+=,@%".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// One line per change, suitable for `eval "$(pyswitch ...)"`.
pub fn render_exports(changes: &[EnvChange]) -> String {
    let mut out = String::new();
    for change in changes {
        match change {
            EnvChange::Set { name, value } => {
                let _ = writeln!(out, "export {}={}", name, shell_quote(value));
            }
            EnvChange::Unset { name } => {
                let _ = writeln!(out, "unset {}", name);
            }
        }
    }
    out
}

/// Script that performs the search-path switch itself when sourced, so a
/// session startup hook does not depend on this binary.
pub fn switch_script(target: &Target) -> String {
    let exe = shell_quote(&target.executable);
    let version = shell_quote(&target.version);
    let mut script = format!(
        r#"#!/bin/sh
# Switch this shell to {exe}.
# Usage: . {{this file}}

_pyswitch_exe=$(command -v {exe} 2>/dev/null)
if [ -z "$_pyswitch_exe" ]; then
    printf 'error: %s not found in PATH\n' {exe} >&2
    return 1 2>/dev/null || exit 1
fi

if [ -z "${{{old}+x}}" ]; then
    export {old}="$PATH"
fi
export PATH="$(dirname "$_pyswitch_exe"):$PATH"
"#,
        exe = exe,
        old = OLD_PATH_VAR,
    );
    for marker in VERSION_MARKERS {
        let _ = writeln!(script, "export {}={}", marker, version);
    }
    script.push_str("unset _pyswitch_exe\n");
    script
}

/// Shell aliases for the versioned interpreter and its package manager,
/// e.g. `python312` and `pip312`.
pub fn alias_file(target: &Target) -> String {
    let exe = shell_quote(&target.executable);
    let compact = target.compact_version();
    let mut out = format!("# aliases for {}\n", exe);
    for (name, command) in [
        (format!("python{compact}"), exe.clone()),
        (format!("pip{compact}"), format!("{exe} -m pip")),
        ("python".to_string(), exe.clone()),
    ] {
        let _ = writeln!(out, "alias {}={}", name, shell_quote(&command));
    }
    out
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| SwitchError::io(format!("cannot create {}", parent.display()), e))?;
    }
    std::fs::write(path, contents)
        .map_err(|e| SwitchError::io(format!("cannot write {}", path.display()), e))
}

/// Write [`alias_file`] to `path`. Meant to be sourced, so it is not executable.
pub fn write_alias_file(path: &Path, target: &Target) -> Result<()> {
    write_file(path, &alias_file(target))?;
    tracing::info!(path = %path.display(), "wrote alias file");
    Ok(())
}

/// Write [`switch_script`] to `path` and mark it executable.
pub fn write_switch_script(path: &Path, target: &Target) -> Result<()> {
    write_file(path, &switch_script(target))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| SwitchError::io(format!("cannot chmod {}", path.display()), e))?;
    }
    tracing::info!(path = %path.display(), "wrote switch script");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(shell_quote("/usr/bin:/bin"), "/usr/bin:/bin");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
    }

    #[test]
    fn exports_and_unsets() {
        let text = render_exports(&[
            EnvChange::Set {
                name: "PATH".into(),
                value: "/opt/alt312/bin:/usr/bin".into(),
            },
            EnvChange::Unset {
                name: "PYTHONHOME".into(),
            },
            EnvChange::Set {
                name: "VIRTUAL_ENV".into(),
                value: "/home/my user/venvs/py312".into(),
            },
        ]);
        assert_eq!(
            text,
            "export PATH=/opt/alt312/bin:/usr/bin\n\
             unset PYTHONHOME\n\
             export VIRTUAL_ENV='/home/my user/venvs/py312'\n"
        );
    }

    #[test]
    fn script_mentions_target_and_markers() {
        let script = switch_script(&Target::new("python3.12", "3.12"));
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("command -v python3.12"));
        assert!(script.contains("export PYSWITCH_OLD_PATH=\"$PATH\""));
        assert!(script.contains("${PYSWITCH_OLD_PATH+x}"));
        assert!(script.contains("export PY_PYTHON=3.12\n"));
        assert!(script.contains("export PYTHON_VERSION=3.12\n"));
        assert!(script.contains("return 1"));
    }

    #[test]
    fn aliases_name_the_versioned_commands() {
        assert_eq!(
            alias_file(&Target::new("python3.12", "3.12")),
            "# aliases for python3.12\n\
             alias python312=python3.12\n\
             alias pip312='python3.12 -m pip'\n\
             alias python=python3.12\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn hostile_target_name_stays_literal() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ran");
        let name = format!("py\"$(touch {})\"3.12", marker.display());
        let script = tmp.path().join("switch.sh");
        write_switch_script(&script, &Target::new(name.as_str(), "3.12")).unwrap();

        let out = std::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(format!(". {}", script.display()))
            .env("PATH", "/usr/bin:/bin")
            .output()
            .unwrap();
        assert!(!out.status.success());
        assert!(!marker.exists());
        let stderr = String::from_utf8(out.stderr).unwrap();
        assert!(stderr.contains(&format!("error: {} not found", name)));
    }

    #[test]
    #[cfg(unix)]
    fn written_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/switch_to_python312.sh");
        write_switch_script(&path, &Target::new("python3.12", "3.12")).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    #[cfg(unix)]
    fn sourced_script_switches_path() {
        use crate::search_path::tests::touch_executable;
        let tmp = tempfile::tempdir().unwrap();
        let alt = tmp.path().join("alt/bin");
        touch_executable(&alt.join("python3.12"));
        let script = tmp.path().join("switch.sh");
        write_switch_script(&script, &Target::new("python3.12", "3.12")).unwrap();

        let out = std::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(format!(
                ". {} && echo \"$PATH|$PY_PYTHON|$PYSWITCH_OLD_PATH\"",
                script.display()
            ))
            .env("PATH", format!("{}:/usr/bin:/bin", alt.display()))
            .env_remove(OLD_PATH_VAR)
            .output()
            .unwrap();
        let stdout = String::from_utf8(out.stdout).unwrap();
        assert_eq!(
            stdout.trim(),
            format!(
                "{alt}:{alt}:/usr/bin:/bin|3.12|{alt}:/usr/bin:/bin",
                alt = alt.display()
            )
        );
    }
}
