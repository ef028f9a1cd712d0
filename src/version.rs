//! Interpreter version markers and `--version` probing.

use crate::command::{CommandRunner, Invocation};
use crate::env::Environment;
use crate::error::{Result, SwitchError};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static VERSION_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Python\s+(\d+)\.(\d+)(?:\.(\d+))?").unwrap());

static NAME_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.\d+)$").unwrap());

/// Version reported by an interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InterpreterVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl InterpreterVersion {
    /// Parse the first `Python X.Y[.Z]` occurrence in `text`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_OUTPUT.captures(text)?;
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps.get(3).and_then(|m| m.as_str().parse().ok()),
        })
    }

    /// `major.minor`, the form used for version markers.
    pub fn marker(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// True when this version is at least the `X.Y` given in `marker`.
    /// Unparseable markers never match.
    pub fn satisfies(&self, marker: &str) -> bool {
        let mut parts = marker.split('.').map(str::parse::<u32>);
        match (parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor))) => (self.major, self.minor) >= (major, minor),
            (Some(Ok(major)), None) => self.major >= major,
            _ => false,
        }
    }
}

impl fmt::Display for InterpreterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Version marker from the trailing digits of an executable name:
/// `python3.12` gives `3.12`, `python3` gives nothing.
pub fn marker_from_name(name: &str) -> Option<String> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    NAME_SUFFIX
        .captures(file_name)
        .map(|caps| caps[1].to_string())
}

/// Ask `interpreter` for its version.
///
/// Interpreters before 3.4 print the banner on stderr, so both streams are
/// searched.
pub fn probe_version(
    runner: &dyn CommandRunner,
    interpreter: &Path,
    env: &Environment,
) -> Result<InterpreterVersion> {
    let invocation = Invocation::new(interpreter).arg("--version");
    let output = runner.output(&invocation, env)?;
    InterpreterVersion::parse(&output.stdout)
        .or_else(|| InterpreterVersion::parse(&output.stderr))
        .ok_or_else(|| SwitchError::CommandFailed {
            program: interpreter.display().to_string(),
            code: output.code,
            stderr: format!("unrecognised version output: {}", output.stdout.trim()),
        })
}
