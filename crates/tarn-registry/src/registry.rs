//! The command registry.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::category::CategoryInfo;
use crate::command::Command;
use crate::error::{ExecuteError, RegistryError};
use crate::plan;
use crate::suggest;

/// Category used for commands that do not declare one.
pub const UNCATEGORIZED: &str = "other";

/// Counts and groupings describing the registry contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryMetadata {
    pub total_commands: usize,
    pub namespaces: Vec<String>,
    pub categories: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
struct Inner {
    commands: HashMap<String, Arc<Command>>,
    /// alias -> full command name
    aliases: HashMap<String, String>,
    categories: BTreeMap<String, usize>,
}

impl Inner {
    fn lookup(&self, name: &str) -> Option<Arc<Command>> {
        let key = name.to_lowercase();
        if let Some(cmd) = self.commands.get(&key) {
            return Some(Arc::clone(cmd));
        }
        self.aliases
            .get(&key)
            .and_then(|target| self.commands.get(target))
            .cloned()
    }

    fn owner_of(&self, key: &str) -> Option<String> {
        if self.commands.contains_key(key) {
            return Some(key.to_string());
        }
        self.aliases.get(key).cloned()
    }

    fn visible(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.values().filter(|cmd| !cmd.is_hidden())
    }
}

/// Concurrent store of commands keyed by full name.
///
/// Reads take a shared lock and writes an exclusive one. Command bodies run
/// outside the lock, so a body may use the registry itself.
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command.
    ///
    /// Fails if the full name or any alias is already a command name or an
    /// alias. A failed registration leaves the registry untouched.
    pub fn register(&self, cmd: Command) -> Result<(), RegistryError> {
        cmd.validate()?;

        let mut inner = self.inner.write();
        let name = cmd.full_name().to_string();

        if inner.commands.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }
        if let Some(owner) = inner.aliases.get(&name) {
            return Err(RegistryError::AliasConflict {
                alias: name,
                owner: owner.clone(),
            });
        }

        let mut seen = HashSet::new();
        for alias in cmd.aliases() {
            if alias == &name || !seen.insert(alias.as_str()) {
                return Err(RegistryError::AliasConflict {
                    alias: alias.clone(),
                    owner: name,
                });
            }
            if let Some(owner) = inner.owner_of(alias) {
                return Err(RegistryError::AliasConflict {
                    alias: alias.clone(),
                    owner,
                });
            }
        }

        for alias in cmd.aliases() {
            inner.aliases.insert(alias.clone(), name.clone());
        }
        if let Some(category) = cmd.category() {
            *inner.categories.entry(category.to_string()).or_default() += 1;
        }
        debug!(command = %name, aliases = cmd.aliases().len(), "registered command");
        inner.commands.insert(name, Arc::new(cmd));
        Ok(())
    }

    /// Add a command, panicking on conflict.
    ///
    /// For the built-in catalog, where a conflict is a packaging bug.
    pub fn must_register(&self, cmd: Command) {
        if let Err(e) = self.register(cmd) {
            panic!("failed to register command: {e}");
        }
    }

    /// Resolve a full name or alias, case-insensitively.
    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.inner.read().lookup(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a command (by name or alias) together with its aliases.
    pub fn remove(&self, name: &str) -> Result<Arc<Command>, RegistryError> {
        let mut inner = self.inner.write();
        let key = name.to_lowercase();
        let full_name = inner.owner_of(&key).ok_or(RegistryError::NotFound { name: key })?;

        let cmd = inner
            .commands
            .remove(&full_name)
            .ok_or_else(|| RegistryError::NotFound {
                name: full_name.clone(),
            })?;
        inner.aliases.retain(|_, target| target != &full_name);
        if let Some(category) = cmd.category() {
            if let Some(count) = inner.categories.get_mut(category) {
                *count -= 1;
                if *count == 0 {
                    inner.categories.remove(category);
                }
            }
        }
        Ok(cmd)
    }

    /// Drop every command and alias.
    pub fn clear(&self) {
        *self.inner.write() = Inner::default();
    }

    /// Number of registered commands, hidden ones included.
    pub fn len(&self) -> usize {
        self.inner.read().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible commands sorted by full name.
    pub fn list(&self) -> Vec<Arc<Command>> {
        let inner = self.inner.read();
        sorted(inner.visible().cloned().collect())
    }

    /// Visible commands in a namespace.
    pub fn list_by_namespace(&self, namespace: &str) -> Vec<Arc<Command>> {
        let namespace = namespace.to_lowercase();
        let inner = self.inner.read();
        sorted(
            inner
                .visible()
                .filter(|cmd| cmd.namespace().map(str::to_lowercase).as_deref() == Some(namespace.as_str()))
                .cloned()
                .collect(),
        )
    }

    /// Visible commands in a category.
    pub fn list_by_category(&self, category: &str) -> Vec<Arc<Command>> {
        let inner = self.inner.read();
        sorted(
            inner
                .visible()
                .filter(|cmd| cmd.category() == Some(category))
                .cloned()
                .collect(),
        )
    }

    /// Distinct lowercase namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let inner = self.inner.read();
        inner
            .commands
            .values()
            .filter_map(|cmd| cmd.namespace().map(str::to_lowercase))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Categories that have at least one command, sorted by name.
    pub fn categories(&self) -> Vec<String> {
        self.inner.read().categories.keys().cloned().collect()
    }

    /// Categories sorted by display order, then name.
    pub fn category_order(&self) -> Vec<String> {
        let mut categories: Vec<(u32, String)> = self
            .categories()
            .into_iter()
            .map(|c| (CategoryInfo::for_category(&c).order, c))
            .collect();
        categories.sort();
        categories.into_iter().map(|(_, c)| c).collect()
    }

    /// Visible commands grouped by category.
    pub fn categorized(&self) -> BTreeMap<String, Vec<Arc<Command>>> {
        let inner = self.inner.read();
        let mut grouped: BTreeMap<String, Vec<Arc<Command>>> = BTreeMap::new();
        for cmd in inner.visible() {
            let category = cmd.category().unwrap_or(UNCATEGORIZED).to_string();
            grouped.entry(category).or_default().push(Arc::clone(cmd));
        }
        for cmds in grouped.values_mut() {
            cmds.sort_by(|a, b| a.full_name().cmp(b.full_name()));
        }
        grouped
    }

    /// Case-insensitive substring search over name, namespace, method,
    /// descriptions and tags. Hidden commands never match.
    pub fn search(&self, query: &str) -> Vec<Arc<Command>> {
        let query = query.to_lowercase();
        let inner = self.inner.read();
        sorted(
            inner
                .visible()
                .filter(|cmd| matches_query(cmd, &query))
                .cloned()
                .collect(),
        )
    }

    /// Closest visible command name to `name`.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let inner = self.inner.read();
        suggest::closest(name, inner.visible().map(|cmd| cmd.full_name()))
    }

    pub fn metadata(&self) -> RegistryMetadata {
        let inner = self.inner.read();
        let namespaces = inner
            .commands
            .values()
            .filter_map(|cmd| cmd.namespace().map(str::to_lowercase))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        RegistryMetadata {
            total_commands: inner.commands.len(),
            namespaces,
            categories: inner.categories.clone(),
        }
    }

    /// Run a command after its dependencies.
    ///
    /// Dependencies run first, depth-first in declaration order, each at
    /// most once and without arguments. The first failure stops the chain
    /// and is returned with the body's own message.
    pub fn execute(&self, name: &str, args: &[String]) -> Result<(), ExecuteError> {
        let order = {
            let inner = self.inner.read();
            let target = inner.lookup(name).ok_or_else(|| ExecuteError::UnknownCommand {
                name: name.to_string(),
                suggestion: suggest::closest(name, inner.visible().map(|cmd| cmd.full_name())),
            })?;
            plan::execution_order(target, |dep| inner.lookup(dep))?
        };

        let last = order.len().saturating_sub(1);
        for (position, cmd) in order.iter().enumerate() {
            if let Some(notice) = cmd.deprecated() {
                warn!(command = %cmd.full_name(), "'{}' is deprecated. {}", cmd.full_name(), notice);
            }

            let result = if position == last {
                debug!(command = %cmd.full_name(), args = args.len(), "running command");
                cmd.invoke(args)
            } else {
                debug!(command = %cmd.full_name(), "running dependency");
                cmd.invoke(&[])
            };

            result.map_err(|source| ExecuteError::Failed {
                command: cmd.full_name().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

fn sorted(mut cmds: Vec<Arc<Command>>) -> Vec<Arc<Command>> {
    cmds.sort_by(|a, b| a.full_name().cmp(b.full_name()));
    cmds
}

fn matches_query(cmd: &Command, query: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(query);
    contains(cmd.name())
        || contains(cmd.full_name())
        || cmd.namespace().is_some_and(contains)
        || cmd.method().is_some_and(contains)
        || contains(cmd.description())
        || cmd.long_description().is_some_and(contains)
        || cmd.tags().iter().any(|tag| contains(tag.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandBuilder;

    fn noop(name: &str) -> Command {
        CommandBuilder::new(name).run(|| Ok(())).build().unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let registry = Registry::new();
        registry.register(noop("build")).unwrap();
        assert!(registry.contains("build"));
        assert!(registry.contains("BUILD"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_is_rejected_without_mutation() {
        let registry = Registry::new();
        registry
            .register(
                CommandBuilder::new("build")
                    .alias("b")
                    .run(|| Ok(()))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let dup = CommandBuilder::new("build")
            .alias("compile")
            .run(|| Ok(()))
            .build()
            .unwrap();
        let err = registry.register(dup).unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyRegistered {
                name: "build".to_string()
            }
        );
        assert!(registry.get("compile").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_alias_colliding_with_name_is_rejected_atomically() {
        let registry = Registry::new();
        registry.register(noop("lint")).unwrap();

        let cmd = CommandBuilder::new("check")
            .aliases(["chk", "lint"])
            .category("quality")
            .run(|| Ok(()))
            .build()
            .unwrap();
        let err = registry.register(cmd).unwrap_err();
        assert!(matches!(err, RegistryError::AliasConflict { ref alias, .. } if alias == "lint"));

        assert!(registry.get("chk").is_none());
        assert!(registry.get("check").is_none());
        assert!(registry.categories().is_empty());
    }

    #[test]
    fn test_name_colliding_with_alias_is_rejected() {
        let registry = Registry::new();
        registry
            .register(CommandBuilder::new("format").alias("fmt").run(|| Ok(())).build().unwrap())
            .unwrap();
        let err = registry.register(noop("fmt")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::AliasConflict {
                alias: "fmt".to_string(),
                owner: "format".to_string()
            }
        );
    }

    #[test]
    fn test_alias_equal_to_own_name_is_rejected() {
        let registry = Registry::new();
        let cmd = CommandBuilder::new("doc").alias("doc").run(|| Ok(())).build().unwrap();
        assert!(registry.register(cmd).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_drops_aliases() {
        let registry = Registry::new();
        registry
            .register(
                CommandBuilder::new("format")
                    .aliases(["fmt", "f"])
                    .category("quality")
                    .run(|| Ok(()))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let removed = registry.remove("fmt").unwrap();
        assert_eq!(removed.full_name(), "format");
        assert!(registry.get("format").is_none());
        assert!(registry.get("f").is_none());
        assert!(registry.categories().is_empty());

        // the freed alias can be claimed again
        registry.register(noop("fmt")).unwrap();
    }

    #[test]
    fn test_remove_unknown() {
        let registry = Registry::new();
        assert!(matches!(
            registry.remove("ghost"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_clear_allows_reregistration() {
        let registry = Registry::new();
        registry.register(noop("build")).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        registry.register(noop("build")).unwrap();
    }

    #[test]
    fn test_hidden_commands_resolve_but_are_not_listed() {
        let registry = Registry::new();
        registry.register(noop("build")).unwrap();
        registry
            .register(CommandBuilder::new("internal").hidden().run(|| Ok(())).build().unwrap())
            .unwrap();

        assert!(registry.get("internal").is_some());
        let listed: Vec<_> = registry.list().iter().map(|c| c.full_name().to_string()).collect();
        assert_eq!(listed, ["build"]);
        assert!(registry.search("internal").is_empty());
    }

    #[test]
    fn test_list_by_namespace_and_category() {
        let registry = Registry::new();
        for (ns, method, category) in [
            ("build", "release", "build"),
            ("build", "debug", "build"),
            ("test", "unit", "test"),
        ] {
            registry
                .register(
                    CommandBuilder::namespaced(ns, method)
                        .category(category)
                        .run(|| Ok(()))
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }

        let build: Vec<_> = registry
            .list_by_namespace("BUILD")
            .iter()
            .map(|c| c.full_name().to_string())
            .collect();
        assert_eq!(build, ["build:debug", "build:release"]);
        assert_eq!(registry.list_by_category("test").len(), 1);
        assert_eq!(registry.namespaces(), ["build", "test"]);
        assert_eq!(registry.category_order(), ["build", "test"]);

        let meta = registry.metadata();
        assert_eq!(meta.total_commands, 3);
        assert_eq!(meta.categories.get("build"), Some(&2));
    }

    #[test]
    fn test_categorized_uses_fallback_category() {
        let registry = Registry::new();
        registry.register(noop("misc")).unwrap();
        let grouped = registry.categorized();
        assert_eq!(grouped[UNCATEGORIZED].len(), 1);
    }

    #[test]
    fn test_search_matches_description_and_tags() {
        let registry = Registry::new();
        registry
            .register(
                CommandBuilder::new("audit")
                    .description("Scan dependencies for VULNERABILITIES")
                    .run(|| Ok(()))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                CommandBuilder::new("sbom")
                    .tags(["supply-chain"])
                    .run(|| Ok(()))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(registry.search("vulnerab").len(), 1);
        assert_eq!(registry.search("SUPPLY").len(), 1);
        assert!(registry.search("nothing-like-this").is_empty());
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        registry.register(noop(&format!("task-{i}-{j}"))).unwrap();
                        let _ = registry.search("task");
                        assert!(registry.get(&format!("task-{i}-{j}")).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 200);
    }
}
