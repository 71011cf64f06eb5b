//! Wiring of registry, built-ins, project commands and output.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use console::style;
use tarn_builtins::{register_all, BuiltinContext};
use tarn_common_config::{vars, ConfigLoader, Environment, TarnConfig};
use tarn_exec::{CommandRunner, SystemRunner};
use tarn_extension::{ExtensionError, ExtensionLoader, LoaderOptions};
use tarn_registry::Registry;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::cli::{normalize_name, Cli};
use crate::error::CliError;
use crate::output;

/// One invocation of the tool.
pub struct App {
    root: PathBuf,
    config: TarnConfig,
    registry: Arc<Registry>,
    runner: Arc<dyn CommandRunner>,
}

impl App {
    /// Load `.tarn/config.yaml` and apply command-line overrides.
    pub fn load_config(root: &Path, cli: &Cli) -> Result<TarnConfig, CliError> {
        let mut loader = ConfigLoader::new(root);
        if let Some(path) = Environment::get(vars::TARN_CONFIG) {
            loader = loader.with_file(path);
        }
        let mut config = loader.load()?;
        if let Some(timeout) = cli.timeout {
            config.timeout = timeout;
        }
        Ok(config)
    }

    /// Register the built-in commands.
    pub fn new(root: impl Into<PathBuf>, config: TarnConfig, handle: Handle) -> Result<Self, CliError> {
        let root = root.into();
        debug!(timeout = ?config.timeout, root = %root.display(), "configuration loaded");

        let runner: Arc<dyn CommandRunner> =
            Arc::new(SystemRunner::new(handle).with_timeout(config.timeout));
        let registry = Arc::new(Registry::new());
        let ctx = BuiltinContext::new(Arc::clone(&runner), &root).with_cargo(&config.extensions.cargo);
        register_all(&registry, &ctx).map_err(|e| CliError::Other(e.into()))?;

        Ok(Self {
            root,
            config,
            registry,
            runner,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn loader(&self) -> ExtensionLoader {
        let extensions = &self.config.extensions;
        ExtensionLoader::new(&self.root, Arc::clone(&self.runner)).with_options(LoaderOptions {
            dir_name: extensions.dir.clone(),
            file_name: extensions.file.clone(),
            cache_dir: PathBuf::from(&self.config.cache_dir),
            cargo: extensions.cargo.clone(),
            timeout: self.config.timeout,
        })
    }

    /// Register project commands. Failures are logged and leave the
    /// built-ins in place.
    async fn load_extensions(&self) {
        if !self.config.extensions.enabled {
            debug!("project commands disabled");
            return;
        }
        let loader = self.loader();
        let registry = Arc::clone(&self.registry);
        let outcome = tokio::task::spawn_blocking(move || loader.load(&registry)).await;
        match outcome {
            Ok(Ok(report)) => {
                for conflict in &report.conflicts {
                    warn!("project command skipped: {conflict}");
                }
                if let Some(source) = &report.source {
                    debug!(
                        source = %source.display(),
                        registered = report.registered.len(),
                        cache_hit = report.cache_hit,
                        "project commands ready"
                    );
                }
            }
            Ok(Err(e)) => {
                if let ExtensionError::Compile { stderr, .. } = &e {
                    debug!(%stderr, "compiler output");
                }
                warn!("project commands unavailable: {e}");
            }
            Err(e) => warn!("project command loader stopped: {e}"),
        }
    }

    /// Dispatch on the parsed flags.
    pub async fn run(&self, cli: Cli) -> Result<(), CliError> {
        if cli.init {
            let path = tarn_extension::init(&self.root, &self.loader().discovery())?;
            println!("{} created {}", style("✓").green(), path.display());
            return Ok(());
        }
        if cli.clean {
            if self.loader().clean()? {
                println!("{} removed {}", style("✓").green(), self.loader().cache_dir().display());
            } else {
                println!("nothing to clean");
            }
            return Ok(());
        }

        self.load_extensions().await;
        let registry = self.registry();

        if cli.version {
            print!("{}", output::version(registry));
            return Ok(());
        }

        let command = cli.command.as_deref().map(normalize_name);
        if cli.help || command.as_deref() == Some("help") {
            let topic = match command.as_deref() {
                Some("help") => cli.args.first().map(|a| normalize_name(a)),
                other => other.map(str::to_string),
            };
            match topic {
                Some(topic) => print!("{}", output::help_for(registry, &topic)?),
                None => print!("{}", output::general_help(registry)),
            }
            return Ok(());
        }

        if let Some(query) = &cli.search {
            if cli.json {
                println!("{}", output::json(&registry.search(query))?);
            } else {
                print!("{}", output::search(registry, query));
            }
            return Ok(());
        }

        if cli.list || cli.namespace {
            if cli.json {
                println!("{}", output::json(&registry.list())?);
            } else if cli.namespace {
                print!("{}", output::list_by_namespace(registry));
            } else {
                print!("{}", output::list(registry));
            }
            return Ok(());
        }

        match command {
            Some(name) => self.execute(name, cli.args).await,
            None => {
                print!("{}", output::quick_list(registry));
                Ok(())
            }
        }
    }

    async fn execute(&self, name: String, args: Vec<String>) -> Result<(), CliError> {
        let registry = Arc::clone(&self.registry);
        let started = Instant::now();
        let target = name.clone();
        let result = tokio::task::spawn_blocking(move || registry.execute(&target, &args))
            .await
            .map_err(|e| CliError::Other(e.into()))?;

        match result {
            Ok(()) => {
                info!(command = %name, elapsed = ?started.elapsed(), "completed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
