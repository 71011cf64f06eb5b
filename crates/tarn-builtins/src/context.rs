//! Shared state for built-in bodies.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tarn_exec::{CommandRunner, ProcessSpec};
use tarn_registry::{BoxError, CommandResult};
use tracing::debug;

/// What every built-in needs to start a process.
#[derive(Clone)]
pub struct BuiltinContext {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    cargo: String,
    timeout: Option<Duration>,
}

impl BuiltinContext {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
            cargo: "cargo".to_string(),
            timeout: None,
        }
    }

    /// Program used for cargo invocations.
    pub fn with_cargo(mut self, cargo: impl Into<String>) -> Self {
        self.cargo = cargo.into();
        self
    }

    /// Per-process timeout; the runner's default applies otherwise.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cargo_program(&self) -> &str {
        &self.cargo
    }

    pub fn cargo<I, S>(&self, args: I) -> ProcessSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec(&self.cargo).args(args)
    }

    pub fn git<I, S>(&self, args: I) -> ProcessSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec("git").args(args)
    }

    fn spec(&self, program: &str) -> ProcessSpec {
        let spec = ProcessSpec::new(program).current_dir(&self.root);
        match self.timeout {
            Some(timeout) => spec.timeout(timeout),
            None => spec,
        }
    }

    /// Run `spec`, turning a process failure into a body error.
    pub fn run(&self, spec: ProcessSpec) -> CommandResult {
        debug!(command = %spec.command_line(), "running");
        self.runner
            .run(&spec)
            .map(|_| ())
            .map_err(|e| Box::new(e) as BoxError)
    }
}

impl std::fmt::Debug for BuiltinContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinContext")
            .field("root", &self.root)
            .field("cargo", &self.cargo)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
