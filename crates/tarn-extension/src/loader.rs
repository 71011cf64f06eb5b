//! Loading project commands into a registry.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tarn_exec::{CommandRunner, ProcessSpec, DEFAULT_TIMEOUT};
use tarn_registry::{BoxError, CommandBuilder, Registry, RegistryError};
use tracing::{debug, info, warn};

use crate::compile::{compile, find_cargo};
use crate::discovery::{Discovery, ExtensionSource, DEFAULT_DIR, DEFAULT_FILE};
use crate::error::{ExtensionError, Result};
use crate::fingerprint::{fingerprint, FingerprintInput};
use crate::harness::{binary_path, module_names, Harness};
use crate::parse::{parse_source, CommandDef};

/// Category given to every project command.
pub const USER_CATEGORY: &str = "user";

/// Where to look for sources and how to build them.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub dir_name: String,
    pub file_name: String,
    /// Cache root; relative paths are resolved against the project root.
    pub cache_dir: PathBuf,
    pub cargo: String,
    /// Bound on `cargo build`.
    pub timeout: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            dir_name: DEFAULT_DIR.to_string(),
            file_name: DEFAULT_FILE.to_string(),
            cache_dir: PathBuf::from(".tarn/cache"),
            cargo: "cargo".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A command that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub name: String,
    pub reason: String,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Outcome of [`ExtensionLoader::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub source: Option<PathBuf>,
    pub fingerprint: Option<String>,
    /// Full names registered, in registration order.
    pub registered: Vec<String>,
    pub conflicts: Vec<Conflict>,
    pub cache_hit: bool,
}

impl LoadReport {
    /// Nothing to load.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty() && self.conflicts.is_empty()
    }
}

/// Sources parsed and a harness generated, ready to compile or reuse.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub source: ExtensionSource,
    pub commands: Vec<CommandDef>,
    /// alias -> command name
    pub aliases: BTreeMap<String, String>,
    pub harness: Harness,
    pub fingerprint: String,
    pub project_dir: PathBuf,
    pub binary: PathBuf,
    /// Definitions dropped before generation (duplicate names).
    pub conflicts: Vec<Conflict>,
}

/// Discovers, compiles and registers project commands.
pub struct ExtensionLoader {
    root: PathBuf,
    options: LoaderOptions,
    runner: Arc<dyn CommandRunner>,
}

impl ExtensionLoader {
    pub fn new(root: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            root: root.into(),
            options: LoaderOptions::default(),
            runner,
        }
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn discovery(&self) -> Discovery {
        Discovery::new(&self.options.dir_name, &self.options.file_name)
    }

    /// Absolute cache root.
    pub fn cache_dir(&self) -> PathBuf {
        if self.options.cache_dir.is_absolute() {
            self.options.cache_dir.clone()
        } else {
            self.root.join(&self.options.cache_dir)
        }
    }

    /// Discover and parse sources and generate the harness.
    ///
    /// Returns `None` when the project has no sources or they export no
    /// commands.
    pub fn prepare(&self) -> Result<Option<Prepared>> {
        let Some(source) = self.discovery().discover(&self.root)? else {
            return Ok(None);
        };

        let files = source.files();
        let mut sources = Vec::with_capacity(files.len());
        for path in &files {
            let content = std::fs::read_to_string(path).map_err(ExtensionError::io(path))?;
            sources.push((path.clone(), content));
        }

        let base = match &source {
            ExtensionSource::Dir { root, .. } => root.clone(),
            ExtensionSource::File(path) => path.parent().unwrap_or(&self.root).to_path_buf(),
        };
        let modules = module_names(&base, &files);

        let mut seen = HashSet::new();
        let mut commands = Vec::new();
        let mut dispatch = Vec::new();
        let mut aliases = BTreeMap::new();
        let mut conflicts = Vec::new();

        for ((path, content), module) in sources.iter().zip(&modules) {
            let parsed = parse_source(path, content)?;
            for def in parsed.commands {
                let name = def.full_name();
                if !seen.insert(name.clone()) {
                    warn!(command = %name, file = %path.display(), "duplicate project command ignored");
                    conflicts.push(Conflict {
                        name,
                        reason: format!("defined again in {}", path.display()),
                    });
                    continue;
                }
                dispatch.push((module.ident.clone(), def.clone()));
                commands.push(def);
            }
            for (alias, target) in parsed.aliases {
                aliases.entry(alias).or_insert(target);
            }
        }

        if commands.is_empty() {
            info!(source = %source.location().display(), "no project commands exported");
            return Ok(None);
        }

        let harness = Harness::generate(&modules, &dispatch);
        let fingerprint = fingerprint(&FingerprintInput {
            root: &self.root,
            sources: &sources,
            harness: &harness.main_rs,
        });
        let project_dir = self.cache_dir().join(&fingerprint);
        let binary = binary_path(&project_dir);

        Ok(Some(Prepared {
            source,
            commands,
            aliases,
            harness,
            fingerprint,
            project_dir,
            binary,
            conflicts,
        }))
    }

    /// Load project commands into `registry`.
    ///
    /// A name that collides with an existing command is reported in
    /// [`LoadReport::conflicts`]; the other commands still register.
    pub fn load(&self, registry: &Registry) -> Result<LoadReport> {
        let Some(prepared) = self.prepare()? else {
            return Ok(LoadReport::empty());
        };

        let cache_hit = prepared.binary.is_file();
        let binary = if cache_hit {
            debug!(fingerprint = %prepared.fingerprint, "reusing compiled project commands");
            prepared.binary.clone()
        } else {
            let cargo = find_cargo(&self.options.cargo)?;
            prepared.harness.write_to(&prepared.project_dir)?;
            compile(
                self.runner.as_ref(),
                &cargo,
                &prepared.project_dir,
                self.options.timeout,
            )?
        };

        let mut report = LoadReport {
            source: Some(prepared.source.location().to_path_buf()),
            fingerprint: Some(prepared.fingerprint.clone()),
            registered: Vec::new(),
            conflicts: prepared.conflicts.clone(),
            cache_hit,
        };

        let names: HashSet<String> = prepared.commands.iter().map(CommandDef::full_name).collect();
        for (alias, target) in &prepared.aliases {
            if !names.contains(&target.to_lowercase()) {
                warn!(%alias, %target, "alias points at an unknown project command");
                report.conflicts.push(Conflict {
                    name: alias.clone(),
                    reason: format!("alias target '{target}' is not a project command"),
                });
            }
        }

        for def in &prepared.commands {
            let name = def.full_name();
            let own_aliases: Vec<String> = prepared
                .aliases
                .iter()
                .filter(|(_, target)| target.to_lowercase() == name)
                .map(|(alias, _)| alias.clone())
                .collect();

            let result = registry.register(self.command(def, &binary, &own_aliases)?);
            let result = match result {
                Err(RegistryError::AliasConflict { alias, owner }) => {
                    report.conflicts.push(Conflict {
                        name: alias.clone(),
                        reason: format!("alias already in use by {owner}"),
                    });
                    registry.register(self.command(def, &binary, &[])?)
                }
                other => other,
            };

            match result {
                Ok(()) => report.registered.push(name),
                Err(e) => {
                    warn!(command = %name, error = %e, "project command not registered");
                    report.conflicts.push(Conflict {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            registered = report.registered.len(),
            conflicts = report.conflicts.len(),
            cache_hit,
            "project commands loaded"
        );
        Ok(report)
    }

    fn command(
        &self,
        def: &CommandDef,
        binary: &Path,
        aliases: &[String],
    ) -> Result<tarn_registry::Command> {
        let mut builder = match (&def.namespace, &def.method) {
            (Some(namespace), Some(method)) => CommandBuilder::namespaced(namespace, method),
            _ => CommandBuilder::new(&def.name),
        };
        if let Some(description) = &def.description {
            builder = builder.description(description);
        }
        if let Some(long) = &def.long_description {
            builder = builder.long_description(long);
        }
        if let Some(notice) = &def.deprecated {
            builder = builder.deprecated(notice);
        }
        builder = builder
            .category(USER_CATEGORY)
            .aliases(aliases.iter().cloned());

        let runner = Arc::clone(&self.runner);
        let program = binary.to_string_lossy().into_owned();
        let name = def.full_name();
        let root = self.root.clone();
        builder = builder.run_with_args(move |args: &[String]| {
            let spec = ProcessSpec::new(program.clone())
                .arg(name.clone())
                .params(args)
                .current_dir(&root);
            runner
                .run(&spec)
                .map(|_| ())
                .map_err(|e| Box::new(e) as BoxError)
        });

        builder.build().map_err(|e| ExtensionError::Parse {
            path: def.source.clone(),
            line: None,
            message: e.to_string(),
        })
    }

    /// Remove compiled project commands.
    pub fn clean(&self) -> Result<bool> {
        let dir = self.cache_dir();
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir).map_err(ExtensionError::io(&dir))?;
        info!(dir = %dir.display(), "removed command cache");
        Ok(true)
    }
}

impl fmt::Debug for ExtensionLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionLoader")
            .field("root", &self.root)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
