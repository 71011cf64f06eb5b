use std::io;
use std::time::Duration;

use thiserror::Error;

/// Exit status reported for a process killed by the timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The child exited unsuccessfully. `message` is the body's own error
    /// when the child reported one.
    #[error("{message}")]
    Failed {
        program: String,
        code: Option<i32>,
        message: String,
        stderr: String,
    },

    #[error("'{program}' timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("I/O error while running process: {0}")]
    Io(#[from] io::Error),
}

impl ProcessError {
    /// Exit status to surface for this error, when one is known.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => *code,
            Self::Timeout { .. } => Some(TIMEOUT_EXIT_CODE),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
