//! The command model.
//!
//! A [`Command`] is built once through [`CommandBuilder`](crate::CommandBuilder)
//! and never mutated afterwards; the registry hands out `Arc<Command>`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{CommandResult, ValidationError};

/// Argumentless command body.
pub type Action = Arc<dyn Fn() -> CommandResult + Send + Sync>;

/// Variadic command body receiving the raw invocation tokens.
pub type ArgsAction = Arc<dyn Fn(&[String]) -> CommandResult + Send + Sync>;

/// One invocable unit.
#[derive(Clone, Default)]
pub struct Command {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) method: Option<String>,
    pub(crate) full_name: String,
    pub(crate) description: String,
    pub(crate) long_description: Option<String>,
    pub(crate) usage: Option<String>,
    pub(crate) examples: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) category: Option<String>,
    pub(crate) since: Option<String>,
    pub(crate) deprecated: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) dependencies: Vec<String>,
    pub(crate) action: Option<Action>,
    pub(crate) args_action: Option<ArgsAction>,
}

impl Command {
    /// Name as given to the builder.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Lowercase `namespace:method`, or the lowercase name for top-level commands.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn since(&self) -> Option<&str> {
        self.since.as_deref()
    }

    /// Deprecation notice, usually naming the replacement.
    pub fn deprecated(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Full names of the commands that must succeed before this one runs.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Whether the command can receive invocation arguments.
    pub fn accepts_args(&self) -> bool {
        self.args_action.is_some()
    }

    /// Check the structural rules every registered command satisfies.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        match (&self.namespace, &self.method) {
            (Some(_), None) => {
                return Err(ValidationError::NamespaceWithoutMethod {
                    name: self.name.clone(),
                })
            }
            (None, Some(_)) => {
                return Err(ValidationError::MethodWithoutNamespace {
                    name: self.name.clone(),
                })
            }
            _ => {}
        }
        if self.action.is_none() && self.args_action.is_none() {
            return Err(ValidationError::NoBody {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Run the body.
    ///
    /// With arguments the variadic body is preferred; without arguments the
    /// argumentless body is preferred. Arguments are dropped when only the
    /// argumentless body exists.
    pub fn invoke(&self, args: &[String]) -> CommandResult {
        match (&self.action, &self.args_action) {
            (_, Some(with_args)) if !args.is_empty() => with_args(args),
            (Some(action), _) => action(),
            (None, Some(with_args)) => with_args(args),
            (None, None) => Err(format!("command '{}' has no executable body", self.full_name).into()),
        }
    }

    /// Serializable view used by listings and JSON output.
    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            name: self.full_name.clone(),
            namespace: self.namespace.clone(),
            method: self.method.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            aliases: self.aliases.clone(),
            dependencies: self.dependencies.clone(),
            deprecated: self.deprecated.clone(),
            since: self.since.clone(),
            accepts_args: self.accepts_args(),
        }
    }

    pub(crate) fn compute_full_name(&mut self) {
        self.full_name = match (&self.namespace, &self.method) {
            (Some(ns), Some(method)) => format!("{}:{}", ns.to_lowercase(), method.to_lowercase()),
            _ => self.name.to_lowercase(),
        };
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("full_name", &self.full_name)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("hidden", &self.hidden)
            .field("dependencies", &self.dependencies)
            .field("action", &self.action.is_some())
            .field("args_action", &self.args_action.is_some())
            .finish()
    }
}

/// Plain-data description of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    pub accepts_args: bool,
}
