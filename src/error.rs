use std::path::PathBuf;
use thiserror::Error;

use crate::command::ExitCode;

/// Errors produced while switching interpreters.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// The requested executable is not present on the search path.
    #[error("{name}: not found in search path ({} directories searched)", .searched.len())]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// An operation needing elevated privileges was refused.
    #[error("permission denied: {operation}: {detail}")]
    PermissionDenied { operation: String, detail: String },

    /// An external program exited unsuccessfully.
    #[error("{program} exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    CommandFailed {
        program: String,
        code: Option<ExitCode>,
        stderr: String,
    },

    /// No version marker could be derived for the target executable.
    #[error("cannot derive a version marker from {name:?}; pass --version")]
    InvalidTarget { name: String },

    /// The search path contains an entry that cannot be joined back.
    #[error("search path entry cannot be joined: {0}")]
    InvalidPath(#[from] std::env::JoinPathsError),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SwitchError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SwitchError::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code reported by the command surface.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SwitchError::NotFound { .. } => 1,
            SwitchError::PermissionDenied { .. } => 77,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, SwitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        let nf = SwitchError::NotFound {
            name: "python3.12".into(),
            searched: vec![PathBuf::from("/usr/bin")],
        };
        assert_eq!(nf.exit_code(), 1);
        assert!(nf.to_string().contains("python3.12"));

        let pd = SwitchError::PermissionDenied {
            operation: "update-alternatives".into(),
            detail: "not root".into(),
        };
        assert_eq!(pd.exit_code(), 77);

        let failed = SwitchError::CommandFailed {
            program: "pip".into(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(failed.exit_code(), 2);
        assert!(failed.to_string().contains("signal"));
    }
}
