use crate::command::{CommandRunner, ExitCode, Invocation, Output};
use crate::env::Environment;
use crate::error::{Result, SwitchError};
use std::ffi::{OsStr, OsString};
use std::process::{Command, ExitStatus, Stdio};

/// Runner that spawns real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, invocation: &Invocation, env: &Environment) -> Result<Output> {
        let output = command_for(&invocation.program, &invocation.args, env)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SwitchError::io(format!("failed to spawn {}", invocation.program.display()), e))?;
        Ok(Output {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `program` inside `env` with inherited stdio and return its exit code.
///
/// The program is resolved against the search path of `env`, so a switched
/// environment picks the switched interpreter.
pub fn run_in(env: &Environment, program: &str, args: &[String]) -> Result<ExitCode> {
    let resolved = env.search_path().locate(program)?;
    let args: Vec<OsString> = args.iter().map(OsString::from).collect();
    tracing::debug!(program = %resolved.display(), "spawning");
    let status = command_for(resolved.as_os_str(), &args, env)
        .status()
        .map_err(|e| SwitchError::io(format!("failed to spawn {}", resolved.display()), e))?;
    Ok(status.code().unwrap_or_else(|| terminated_by_signal(status)))
}

fn command_for(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    env: &Environment,
) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env_clear()
        .envs(env.opaque.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())))
        .envs(env.vars.iter().map(|(k, v)| (OsStr::new(k), OsStr::new(v))))
        .current_dir(&env.current_dir);
    cmd
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}
