use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ProcessError;
use crate::runner::{CommandRunner, ProcessOutput};
use crate::spec::ProcessSpec;

#[derive(Debug, Default)]
struct State {
    specs: Vec<ProcessSpec>,
    failures: Vec<(String, i32)>,
}

/// Runner that records specs instead of spawning them.
///
/// Clones share the same record, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    state: Arc<Mutex<State>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `code` whenever the command line contains `pattern`.
    pub fn fail_when(self, pattern: impl Into<String>, code: i32) -> Self {
        self.state.lock().failures.push((pattern.into(), code));
        self
    }

    pub fn specs(&self) -> Vec<ProcessSpec> {
        self.state.lock().specs.clone()
    }

    /// Recorded command lines in invocation order.
    pub fn command_lines(&self) -> Vec<String> {
        self.state
            .lock()
            .specs
            .iter()
            .map(ProcessSpec::command_line)
            .collect()
    }

    pub fn last(&self) -> Option<ProcessSpec> {
        self.state.lock().specs.last().cloned()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, ProcessError> {
        let mut state = self.state.lock();
        state.specs.push(spec.clone());

        let line = spec.command_line();
        if let Some((_, code)) = state.failures.iter().find(|(pattern, _)| line.contains(pattern.as_str())) {
            return Err(ProcessError::Failed {
                program: spec.program.clone(),
                code: Some(*code),
                message: format!("`{line}` failed with exit code {code}"),
                stderr: String::new(),
            });
        }
        Ok(ProcessOutput {
            code: Some(0),
            ..ProcessOutput::default()
        })
    }
}
