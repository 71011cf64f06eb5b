//! Running child processes.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::ProcessError;
use crate::report::Report;
use crate::spec::ProcessSpec;

/// Timeout applied when neither the caller nor the `ProcessSpec` sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Maximum captured output per stream (10 MB).
const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Output of a successful process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    /// Captured stdout; empty unless the `ProcessSpec` asked for capture.
    pub stdout: String,
    /// Stderr with any harness report line removed.
    pub stderr: String,
    pub report: Option<Report>,
    pub duration: Duration,
}

/// Runs a [`ProcessSpec`] to completion.
///
/// Implementations block the calling thread; command bodies are
/// synchronous.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
        (**self).run(spec)
    }
}

/// Spawns real processes on a tokio runtime.
///
/// [`CommandRunner::run`] blocks on the runtime handle, so it must be
/// called from outside the runtime's worker threads (for example from
/// `spawn_blocking`).
#[derive(Debug, Clone)]
pub struct SystemRunner {
    handle: Handle,
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Spawn `spec` and wait for it, killing the child on timeout.
    pub async fn run_async(&self, spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
        let limit = spec.timeout.unwrap_or(self.timeout);
        let echo = !spec.capture;

        let mut command = tokio::process::Command::from(spec.to_command());
        command
            .stdin(Stdio::inherit())
            .stdout(if spec.capture { Stdio::piped() } else { Stdio::inherit() })
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %spec.command_line(), timeout = ?limit, "spawning process");
        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let wait = async {
            let (stdout, stderr) = tokio::join!(read_stdout(stdout), read_stderr(stderr, echo));
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stdout?, stderr?))
        };

        let outcome = tokio::time::timeout(limit, wait).await;
        let (status, stdout, (stderr, report)) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                warn!(command = %spec.command_line(), timeout = ?limit, "process timed out, killing it");
                let _ = child.kill().await;
                return Err(ProcessError::Timeout {
                    program: spec.program.clone(),
                    after: limit,
                });
            }
        };

        let duration = start.elapsed();
        debug!(command = %spec.command_line(), status = ?status.code(), ?duration, "process finished");

        if !status.success() {
            let message = report
                .as_ref()
                .and_then(|r| r.error.clone())
                .unwrap_or_else(|| match status.code() {
                    Some(code) => format!("`{}` failed with exit code {code}", spec.command_line()),
                    None => format!("`{}` was terminated by a signal", spec.command_line()),
                });
            return Err(ProcessError::Failed {
                program: spec.program.clone(),
                code: status.code(),
                message,
                stderr,
            });
        }

        Ok(ProcessOutput {
            code: status.code(),
            stdout,
            stderr,
            report,
            duration,
        })
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
        self.handle.block_on(self.run_async(spec))
    }
}

async fn read_stdout(stdout: Option<ChildStdout>) -> std::io::Result<String> {
    let content = match stdout {
        Some(stdout) => read_capped(stdout, MAX_OUTPUT_SIZE).await?,
        None => Vec::new(),
    };
    Ok(String::from_utf8_lossy(&content).into_owned())
}

/// Read `reader` to the end, keeping at most `limit` bytes.
///
/// The pipe is drained past the limit so the child never sees a closed
/// stdout.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut content = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut dropped = 0usize;
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let keep = n.min(limit - content.len());
        content.extend_from_slice(&chunk[..keep]);
        dropped += n - keep;
    }
    if dropped > 0 {
        debug!(kept = content.len(), dropped, "captured output truncated");
    }
    Ok(content)
}

/// Collect stderr, pulling out the harness report line. With `echo` set,
/// every other line is forwarded to our own stderr as it arrives.
async fn read_stderr(
    stderr: Option<ChildStderr>,
    echo: bool,
) -> std::io::Result<(String, Option<Report>)> {
    let mut collected = String::new();
    let mut report = None;
    let Some(stderr) = stderr else {
        return Ok((collected, report));
    };

    let mut lines = BufReader::new(stderr).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(parsed) = Report::parse_line(&line) {
            report = Some(parsed);
            continue;
        }
        if echo {
            eprintln!("{line}");
        }
        if collected.len() < MAX_OUTPUT_SIZE {
            collected.push_str(&line);
            collected.push('\n');
        }
    }
    Ok((collected, report))
}
