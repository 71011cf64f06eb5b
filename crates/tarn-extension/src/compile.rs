//! Building a harness project with cargo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tarn_exec::{CommandRunner, ProcessError, ProcessSpec};
use tracing::{debug, info};

use crate::error::{ExtensionError, Result};
use crate::harness::binary_path;

/// Locate `cargo` (or the configured program) on PATH.
pub fn find_cargo(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| ExtensionError::ToolchainMissing {
        program: program.to_string(),
    })
}

/// Compile the harness in `project_dir` and return the binary path.
pub fn compile(
    runner: &dyn CommandRunner,
    cargo: &Path,
    project_dir: &Path,
    timeout: Duration,
) -> Result<PathBuf> {
    let manifest = project_dir.join("Cargo.toml");
    let spec = ProcessSpec::new(cargo.to_string_lossy())
        .args(["build", "--release", "--quiet", "--manifest-path"])
        .arg(manifest.to_string_lossy())
        .env("CARGO_TARGET_DIR", project_dir.join("target").to_string_lossy())
        .current_dir(project_dir)
        .timeout(timeout)
        .capture();

    info!(project = %project_dir.display(), "compiling project commands");
    match runner.run(&spec) {
        Ok(output) => {
            debug!(elapsed = ?output.duration, "project commands compiled");
        }
        Err(ProcessError::Timeout { after, .. }) => {
            return Err(ExtensionError::CompileTimeout { after });
        }
        Err(ProcessError::Failed { message, stderr, .. }) => {
            return Err(ExtensionError::Compile { message, stderr });
        }
        Err(ProcessError::Spawn { program, .. }) => {
            return Err(ExtensionError::ToolchainMissing { program });
        }
        Err(ProcessError::Io(source)) => {
            return Err(ExtensionError::Io {
                path: project_dir.to_path_buf(),
                source,
            });
        }
    }

    let binary = binary_path(project_dir);
    if !binary.is_file() {
        return Err(ExtensionError::Compile {
            message: format!("cargo succeeded but {} is missing", binary.display()),
            stderr: String::new(),
        });
    }
    Ok(binary)
}
