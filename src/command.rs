use crate::env::Environment;
use crate::error::{Result, SwitchError};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// A program and its arguments, ready to be handed to a [`CommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run this invocation through a wrapper such as `sudo -n`.
    pub fn wrapped(self, wrapper: &[OsString]) -> Self {
        let Some((program, rest)) = wrapper.split_first() else {
            return self;
        };
        let mut args: Vec<OsString> = rest.to_vec();
        args.push(self.program.into_os_string());
        args.extend(self.args);
        Self {
            program: PathBuf::from(program),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<ExitCode>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam between the switching logic and the host's process table.
///
/// [`crate::external::SystemRunner`] spawns real processes; tests substitute a
/// recorder.
pub trait CommandRunner {
    /// Run `invocation` to completion with exactly the variables of `env`.
    fn output(&self, invocation: &Invocation, env: &Environment) -> Result<Output>;
}

/// Run `invocation` and turn a non-zero exit into [`SwitchError::CommandFailed`].
pub fn run_checked(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    env: &Environment,
) -> Result<Output> {
    tracing::info!(command = %invocation, "running");
    let output = runner.output(invocation, env)?;
    if output.success() {
        Ok(output)
    } else {
        Err(SwitchError::CommandFailed {
            program: invocation.program.display().to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;

    type Hook = Box<dyn Fn(&Invocation) -> Output>;

    /// Runner that records invocations and answers through an optional hook.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub calls: RefCell<Vec<Invocation>>,
        hook: Option<Hook>,
    }

    impl RecordingRunner {
        pub fn with_hook(hook: impl Fn(&Invocation) -> Output + 'static) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                hook: Some(Box::new(hook)),
            }
        }

        pub fn rendered(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.to_string()).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn output(&self, invocation: &Invocation, _env: &Environment) -> Result<Output> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok(match &self.hook {
                Some(hook) => hook(invocation),
                None => ok_output(""),
            })
        }
    }

    pub(crate) fn ok_output(stdout: &str) -> Output {
        Output {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn wrapped_prefixes_program() {
        let inv = Invocation::new("update-alternatives").arg("--install");
        let wrapped = inv.wrapped(&["sudo".into(), "-n".into()]);
        assert_eq!(wrapped.program, Path::new("sudo"));
        assert_eq!(wrapped.to_string(), "sudo -n update-alternatives --install");
    }

    #[test]
    fn empty_wrapper_is_identity() {
        let inv = Invocation::new("ln").args(["-sf", "a", "b"]);
        assert_eq!(inv.clone().wrapped(&[]), inv);
    }

    #[test]
    fn run_checked_maps_failure() {
        let runner = RecordingRunner::with_hook(|_| Output {
            code: Some(3),
            stdout: String::new(),
            stderr: "boom\n".into(),
        });
        let env = Environment::with_path("");
        let err = run_checked(&runner, &Invocation::new("pip"), &env).unwrap_err();
        match err {
            SwitchError::CommandFailed { program, code, stderr } => {
                assert_eq!(program, "pip");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
