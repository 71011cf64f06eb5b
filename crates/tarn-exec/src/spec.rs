//! Description of a child process.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// What to run and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    /// Overrides the runner's default timeout.
    pub timeout: Option<Duration>,
    /// Capture stdout instead of passing it through to the terminal.
    pub capture: bool,
    /// Tokens delivered through the parameter channel.
    pub params: Option<Vec<String>>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Deliver `tokens` through the parameter channel.
    pub fn params<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
        self.params = Some(tokens.iter().map(|t| t.as_ref().to_string()).collect());
        self
    }

    /// Shell-quoted command line, for logs and messages.
    pub fn command_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }

    /// Standard library command with environment, directory and
    /// parameter channel applied.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        if let Some(tokens) = &self.params {
            tarn_params::apply(&mut cmd, tokens);
        }
        cmd
    }
}
