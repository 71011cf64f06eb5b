//! The built-in command table.

use tarn_params::Params;
use tarn_registry::{CommandBuilder, CommandResult, Registry, RegistryError};
use tracing::{debug, info};

use crate::context::BuiltinContext;
use crate::{cargo, git};

type Body = fn(&BuiltinContext, &Params) -> CommandResult;

/// One row of the catalog.
pub struct Builtin {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub usage: Option<&'static str>,
    pub examples: &'static [&'static str],
    pub aliases: &'static [&'static str],
    pub depends_on: &'static [&'static str],
    body: Body,
}

impl Builtin {
    const fn new(name: &'static str, category: &'static str, description: &'static str, body: Body) -> Self {
        Self {
            name,
            category,
            description,
            usage: None,
            examples: &[],
            aliases: &[],
            depends_on: &[],
            body,
        }
    }

    const fn usage(mut self, usage: &'static str, examples: &'static [&'static str]) -> Self {
        self.usage = Some(usage);
        self.examples = examples;
        self
    }

    const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn depends_on(mut self, dependencies: &'static [&'static str]) -> Self {
        self.depends_on = dependencies;
        self
    }

    fn builder(&self) -> CommandBuilder {
        match self.name.split_once(':') {
            Some((namespace, method)) => CommandBuilder::namespaced(namespace, method),
            None => CommandBuilder::new(self.name),
        }
    }
}

fn ci(_ctx: &BuiltinContext, _params: &Params) -> CommandResult {
    info!("all checks passed");
    Ok(())
}

/// Every built-in, in registration order.
pub const CATALOG: &[Builtin] = &[
    Builtin::new("build", "build", "Build the workspace", cargo::build)
        .usage("tarn build [package=<name>] [features=<list>] [all-features]", &["tarn build", "tarn build package=core"])
        .aliases(&["b"]),
    Builtin::new("build:release", "build", "Build with optimizations", cargo::build_release)
        .usage("tarn build:release [package=<name>] [features=<list>]", &["tarn build:release"]),
    Builtin::new("test", "test", "Run the test suite", cargo::test)
        .usage("tarn test [package=<name>] [filter=<name>]", &["tarn test", "tarn test filter=parser"])
        .aliases(&["t"])
        .depends_on(&["build"]),
    Builtin::new("test:unit", "test", "Run library and binary unit tests", cargo::test_unit),
    Builtin::new("test:doc", "test", "Run documentation tests", cargo::test_doc),
    Builtin::new("bench", "test", "Run benchmarks", cargo::bench)
        .usage("tarn bench [time=<duration>] [count=<n>]", &["tarn bench", "tarn bench time=7s", "tarn bench time=10s count=30"]),
    Builtin::new("lint", "quality", "Run clippy with warnings denied", cargo::lint)
        .aliases(&["l"]),
    Builtin::new("lint:fix", "quality", "Apply clippy suggestions", cargo::lint_fix)
        .usage("tarn lint:fix [allow-dirty]", &["tarn lint:fix allow-dirty"]),
    Builtin::new("format", "quality", "Format all sources", cargo::format)
        .aliases(&["fmt"]),
    Builtin::new("format:check", "quality", "Check formatting without writing", cargo::format_check),
    Builtin::new("clean", "core", "Remove build artifacts", cargo::clean),
    Builtin::new("deps:update", "deps", "Update Cargo.lock", cargo::deps_update)
        .usage("tarn deps:update [package=<name>]", &["tarn deps:update", "tarn deps:update package=serde"]),
    Builtin::new("deps:tree", "deps", "Show the dependency tree", cargo::deps_tree)
        .usage("tarn deps:tree [package=<name>] [depth=<n>]", &["tarn deps:tree depth=1"]),
    Builtin::new("doc", "docs", "Build API documentation", cargo::doc)
        .usage("tarn doc [open]", &["tarn doc open"]),
    Builtin::new("git:status", "git", "Show a short working tree status", git::status),
    Builtin::new("release:check", "release", "Verify the package can be published", cargo::release_check)
        .usage("tarn release:check [package=<name>] [allow-dirty]", &["tarn release:check package=tarn"])
        .depends_on(&["format:check", "lint", "test"]),
    Builtin::new("ci", "core", "Check formatting, lint and test", ci)
        .depends_on(&["format:check", "lint", "test"]),
];

/// Register the catalog into `registry`.
pub fn register_all(registry: &Registry, ctx: &BuiltinContext) -> Result<(), RegistryError> {
    for builtin in CATALOG {
        let ctx = ctx.clone();
        let body = builtin.body;
        let mut builder = builtin
            .builder()
            .description(builtin.description)
            .category(builtin.category)
            .aliases(builtin.aliases.iter().copied())
            .dependencies(builtin.depends_on.iter().copied())
            .run_with_args(move |args: &[String]| body(&ctx, &Params::parse(args)));
        if let Some(usage) = builtin.usage {
            builder = builder.usage(usage);
        }
        for example in builtin.examples {
            builder = builder.example(*example);
        }
        registry.register(builder.build()?)?;
    }
    debug!(count = CATALOG.len(), "registered built-in commands");
    Ok(())
}
