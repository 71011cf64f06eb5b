//! Error types for command construction, registration and execution.

use thiserror::Error;

/// Boxed error returned by command bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of running a command body.
pub type CommandResult = Result<(), BoxError>;

/// A command definition failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("command name must not be empty")]
    EmptyName,

    #[error("command '{name}' sets a namespace without a method")]
    NamespaceWithoutMethod { name: String },

    #[error("command '{name}' sets a method without a namespace")]
    MethodWithoutNamespace { name: String },

    #[error("command '{name}' has no executable body")]
    NoBody { name: String },
}

/// Registration into the [`Registry`](crate::Registry) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid command: {0}")]
    Invalid(#[from] ValidationError),

    #[error("command already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("alias '{alias}' already in use by {owner}")]
    AliasConflict { alias: String, owner: String },

    #[error("command not found: {name}")]
    NotFound { name: String },
}

/// Execution of a command or one of its dependencies failed.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("unknown command '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },

    #[error("command '{command}' depends on unknown command '{dependency}'")]
    UnknownDependency { command: String, dependency: String },

    #[error("dependency cycle detected: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    /// A body returned an error. The message is the body's own.
    #[error("{source}")]
    Failed {
        command: String,
        #[source]
        source: BoxError,
    },
}

impl ExecuteError {
    /// Name of the command whose body failed, if this is a body failure.
    pub fn failed_command(&self) -> Option<&str> {
        match self {
            Self::Failed { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Closest known command name for an unknown command.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnknownCommand { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{s}'?"),
        None => String::new(),
    }
}
