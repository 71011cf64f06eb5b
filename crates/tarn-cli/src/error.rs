//! CLI errors and their exit codes.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use console::style;
use tarn_common_config::{ConfigError, EnvError};
use tarn_exec::ProcessError;
use tarn_extension::ExtensionError;
use tarn_registry::ExecuteError;
use thiserror::Error;

/// Exit status for a process killed by the timeout.
pub const TIMEOUT_EXIT: u8 = 124;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        hint: Option<String>,
    },

    /// Unknown command or namespace.
    #[error("{message}")]
    NotFound {
        message: String,
        name: String,
        suggestion: Option<String>,
    },

    /// A command body failed; `code` is the child's exit status when known.
    #[error("{message}")]
    Command {
        message: String,
        command: String,
        code: Option<i32>,
    },

    #[error("{message}")]
    Timeout { message: String, command: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Numeric exit status.
    pub fn code(&self) -> u8 {
        match self {
            Self::Config { .. } => 2,
            Self::Io { .. } => 3,
            Self::Validation { .. } => 5,
            Self::NotFound { .. } => 6,
            Self::Command { code, .. } => code
                .and_then(|c| u8::try_from(c).ok())
                .filter(|c| *c != 0)
                .unwrap_or(1),
            Self::Timeout { .. } => TIMEOUT_EXIT,
            Self::Other(_) => 1,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Config { hint, .. } | Self::Validation { hint, .. } => hint.clone(),
            Self::NotFound { .. } => Some("run 'tarn -l' to list commands or 'tarn -search <term>' to find one".to_string()),
            Self::Timeout { .. } => Some("raise the limit with -t <duration> or TARN_TIMEOUT".to_string()),
            _ => None,
        }
    }

    pub fn io_with_path(message: impl Into<String>, source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            message: message.into(),
            source,
            path: Some(path.into()),
        }
    }

    pub fn validation_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn not_found(name: impl Into<String>, suggestion: Option<String>) -> Self {
        let name = name.into();
        let message = match &suggestion {
            Some(s) => format!("unknown command '{name}'. Did you mean '{s}'?"),
            None => format!("unknown command '{name}'"),
        };
        Self::NotFound {
            message,
            name,
            suggestion,
        }
    }

    /// Print the error and its hint to stderr.
    pub fn report(&self) {
        eprintln!("{} {}", style("error:").red().bold(), self);
        if let Some(hint) = self.hint() {
            eprintln!("  {} {}", style("hint:").cyan(), hint);
        }
    }
}

impl From<ExecuteError> for CliError {
    fn from(err: ExecuteError) -> Self {
        match err {
            ExecuteError::UnknownCommand { name, suggestion } => Self::not_found(name, suggestion),
            err @ (ExecuteError::UnknownDependency { .. } | ExecuteError::Cycle { .. }) => Self::Validation {
                message: err.to_string(),
                hint: None,
            },
            ExecuteError::Failed { command, source } => {
                let message = source.to_string();
                match source.downcast_ref::<ProcessError>() {
                    Some(process) if process.is_timeout() => Self::Timeout { message, command },
                    Some(process) => Self::Command {
                        message,
                        command,
                        code: process.exit_code(),
                    },
                    None => Self::Command {
                        message,
                        command,
                        code: None,
                    },
                }
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: format!("configuration error: {err}"),
            source: Some(Box::new(err)),
            hint: Some("check .tarn/config.yaml or the file named by TARN_CONFIG".to_string()),
        }
    }
}

impl From<EnvError> for CliError {
    fn from(err: EnvError) -> Self {
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
            hint: None,
        }
    }
}

impl From<ExtensionError> for CliError {
    fn from(err: ExtensionError) -> Self {
        match err {
            ExtensionError::AlreadyExists { path } => Self::validation_with_hint(
                format!("{} already exists", path.display()),
                "edit the existing command sources instead",
            ),
            ExtensionError::Io { path, source } => Self::Io {
                message: format!("I/O error at {}: {source}", path.display()),
                source,
                path: Some(path),
            },
            other => Self::Other(other.into()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            path: None,
        }
    }
}
