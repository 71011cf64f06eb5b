//! Fluent construction of [`Command`]s.

use std::sync::Arc;

use crate::command::Command;
use crate::error::{CommandResult, ValidationError};

/// Builds and validates a [`Command`].
///
/// ```
/// use tarn_registry::CommandBuilder;
///
/// let cmd = CommandBuilder::namespaced("build", "release")
///     .description("Build with optimizations")
///     .alias("br")
///     .depends_on("fmt:check")
///     .run(|| Ok(()))
///     .build()
///     .unwrap();
///
/// assert_eq!(cmd.full_name(), "build:release");
/// ```
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    cmd: Command,
}

impl CommandBuilder {
    /// Start a top-level command.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            cmd: Command {
                name: name.into(),
                ..Command::default()
            },
        }
    }

    /// Start a `namespace:method` command.
    pub fn namespaced(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let method = method.into();
        let name = if namespace.is_empty() || method.is_empty() {
            format!("{namespace}{method}")
        } else {
            format!("{namespace}:{method}")
        };
        Self {
            cmd: Command {
                name,
                namespace: Some(namespace).filter(|s| !s.is_empty()),
                method: Some(method).filter(|s| !s.is_empty()),
                ..Command::default()
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.cmd.description = description.into();
        self
    }

    pub fn long_description(mut self, description: impl Into<String>) -> Self {
        self.cmd.long_description = Some(description.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.cmd.usage = Some(usage.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.cmd.examples.push(example.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add an alternate name. Aliases are matched case-insensitively.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.cmd.aliases.push(alias.into().to_lowercase());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd
            .aliases
            .extend(aliases.into_iter().map(|a| a.into().to_lowercase()));
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.cmd.category = Some(category.into());
        self
    }

    /// Version that introduced the command.
    pub fn since(mut self, version: impl Into<String>) -> Self {
        self.cmd.since = Some(version.into());
        self
    }

    /// Mark as deprecated; the message usually names the replacement.
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.cmd.deprecated = Some(message.into());
        self
    }

    /// Exclude from listings and search.
    pub fn hidden(mut self) -> Self {
        self.cmd.hidden = true;
        self
    }

    /// Append a dependency. Dependencies run in the order they were added.
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.cmd.dependencies.push(dependency.into().to_lowercase());
        self
    }

    pub fn dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd
            .dependencies
            .extend(dependencies.into_iter().map(|d| d.into().to_lowercase()));
        self
    }

    /// Set the argumentless body.
    pub fn run<F>(mut self, action: F) -> Self
    where
        F: Fn() -> CommandResult + Send + Sync + 'static,
    {
        self.cmd.action = Some(Arc::new(action));
        self
    }

    /// Set the variadic body.
    pub fn run_with_args<F>(mut self, action: F) -> Self
    where
        F: Fn(&[String]) -> CommandResult + Send + Sync + 'static,
    {
        self.cmd.args_action = Some(Arc::new(action));
        self
    }

    /// Validate and return the command.
    pub fn build(self) -> Result<Command, ValidationError> {
        let mut cmd = self.cmd;
        cmd.validate()?;
        cmd.compute_full_name();
        Ok(cmd)
    }

    /// Like [`build`](Self::build) but panics on invalid input.
    ///
    /// Only for definitions fixed at compile time, such as the built-in catalog.
    pub fn must_build(self) -> Command {
        match self.build() {
            Ok(cmd) => cmd,
            Err(e) => panic!("failed to build command: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_build_minimal_command() {
        let cmd = CommandBuilder::new("build").run(|| Ok(())).build().unwrap();
        assert_eq!(cmd.name(), "build");
        assert_eq!(cmd.full_name(), "build");
        assert!(cmd.namespace().is_none());
        assert!(!cmd.is_hidden());
    }

    #[test]
    fn test_build_sets_metadata() {
        let cmd = CommandBuilder::namespaced("test", "race")
            .description("Run tests with the race detector")
            .long_description("Runs the whole suite")
            .usage("tarn test:race [package=<name>]")
            .example("tarn test:race package=core")
            .tags(["test", "race"])
            .aliases(["TR", "race"])
            .category("test")
            .since("0.2.0")
            .deprecated("use test:unit")
            .hidden()
            .dependencies(["Build"])
            .run(|| Ok(()))
            .build()
            .unwrap();

        assert_eq!(cmd.full_name(), "test:race");
        assert_eq!(cmd.namespace(), Some("test"));
        assert_eq!(cmd.method(), Some("race"));
        assert_eq!(cmd.aliases(), ["tr", "race"]);
        assert_eq!(cmd.dependencies(), ["build"]);
        assert_eq!(cmd.category(), Some("test"));
        assert_eq!(cmd.since(), Some("0.2.0"));
        assert_eq!(cmd.deprecated(), Some("use test:unit"));
        assert_eq!(cmd.examples().len(), 1);
        assert_eq!(cmd.tags(), ["test", "race"]);
        assert!(cmd.is_hidden());
    }

    #[test]
    fn test_build_rejects_empty_name() {
        let err = CommandBuilder::new("  ").run(|| Ok(())).build().unwrap_err();
        assert_eq!(err, ValidationError::EmptyName);
    }

    #[test]
    fn test_build_rejects_missing_body() {
        let err = CommandBuilder::new("deploy").build().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NoBody {
                name: "deploy".to_string()
            }
        );
    }

    #[test_case("build", "" ; "namespace without method")]
    #[test_case("", "linux" ; "method without namespace")]
    fn test_build_rejects_half_namespaced(namespace: &str, method: &str) {
        let result = CommandBuilder::namespaced(namespace, method)
            .run(|| Ok(()))
            .build();
        assert!(matches!(
            result,
            Err(ValidationError::NamespaceWithoutMethod { .. })
                | Err(ValidationError::MethodWithoutNamespace { .. })
        ));
    }

    #[test]
    fn test_args_body_alone_is_enough() {
        let cmd = CommandBuilder::new("bench")
            .run_with_args(|_| Ok(()))
            .build()
            .unwrap();
        assert!(cmd.accepts_args());
    }

    #[test]
    #[should_panic(expected = "failed to build command")]
    fn test_must_build_panics_on_invalid() {
        CommandBuilder::new("broken").must_build();
    }
}
