use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Compiler output lines shown with a compile error.
const DIAGNOSTIC_LINES: usize = 20;

/// Result type for extension operations.
pub type Result<T> = std::result::Result<T, ExtensionError>;

/// Errors raised while discovering, compiling or loading project commands.
///
/// None of these are fatal to the tool: the caller logs them and carries
/// on with the built-in commands.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("failed to parse {}{}: {message}", path.display(), line.map(|l| format!(":{l}")).unwrap_or_default())]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("'{program}' not found on PATH; project commands need a Rust toolchain")]
    ToolchainMissing { program: String },

    /// `stderr` holds the compiler diagnostics; the leading lines are part
    /// of the message.
    #[error("failed to compile project commands: {message}{}", diagnostics(.stderr))]
    Compile { message: String, stderr: String },

    #[error("compiling project commands timed out after {after:?}")]
    CompileTimeout { after: Duration },

    #[error("{} already exists", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtensionError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

fn diagnostics(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for line in lines.iter().take(DIAGNOSTIC_LINES) {
        out.push('\n');
        out.push_str(line);
    }
    if lines.len() > DIAGNOSTIC_LINES {
        out.push_str(&format!("\n... {} more lines", lines.len() - DIAGNOSTIC_LINES));
    }
    out
}
