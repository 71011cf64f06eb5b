//! Rendering of lists, help and version text.
//!
//! Everything returns a `String` so the binary decides where it goes and
//! tests can inspect it.

use std::fmt::Write;
use std::sync::Arc;

use console::{style, Emoji};
use tarn_registry::{CategoryInfo, Command, Registry};

use crate::error::CliError;

static TOOLS: Emoji<'_, '_> = Emoji("🛠  ", "");
static BULB: Emoji<'_, '_> = Emoji("💡 ", "");
static WARN: Emoji<'_, '_> = Emoji("⚠  ", "! ");

const DESCRIPTION_WIDTH: usize = 60;
const NO_DESCRIPTION: &str = "(no description)";

/// Commands shown under "Quick start" when they exist.
const QUICK_START: &[&str] = &["build", "test", "lint", "format", "ci"];

pub fn banner() -> String {
    format!(
        "{}{} {}\n",
        TOOLS,
        style("tarn").bold(),
        style(env!("CARGO_PKG_VERSION")).dim()
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn describe(cmd: &Command) -> String {
    if let Some(message) = cmd.deprecated() {
        return format!("{}DEPRECATED: {message}", WARN);
    }
    match cmd.description() {
        "" => style(NO_DESCRIPTION).dim().to_string(),
        description => truncate(description, DESCRIPTION_WIDTH),
    }
}

fn name_width(cmds: &[Arc<Command>]) -> usize {
    cmds.iter().map(|c| c.full_name().len()).max().unwrap_or(0).max(12)
}

fn rows(out: &mut String, cmds: &[Arc<Command>], indent: &str) {
    let width = name_width(cmds);
    for cmd in cmds {
        let _ = writeln!(
            out,
            "{indent}{:<width$}  {}",
            style(cmd.full_name()).cyan(),
            describe(cmd),
            width = width
        );
    }
}

/// Flat list of visible commands.
pub fn list(registry: &Registry) -> String {
    let cmds = registry.list();
    let mut out = String::new();
    let _ = writeln!(out, "{}", style(format!("Available commands ({}):", cmds.len())).bold());
    rows(&mut out, &cmds, "  ");
    out
}

/// Visible commands grouped by namespace; top-level commands come first.
pub fn list_by_namespace(registry: &Registry) -> String {
    let mut out = String::new();
    let top: Vec<Arc<Command>> = registry
        .list()
        .into_iter()
        .filter(|c| c.namespace().is_none())
        .collect();
    if !top.is_empty() {
        let _ = writeln!(out, "{}", style("Top-level:").bold());
        rows(&mut out, &top, "  ");
    }
    for namespace in registry.namespaces() {
        let cmds = registry.list_by_namespace(&namespace);
        if cmds.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", style(format!("{namespace}:")).bold());
        rows(&mut out, &cmds, "  ");
    }
    out
}

/// Search results, or a hint when nothing matches.
pub fn search(registry: &Registry, query: &str) -> String {
    let found = registry.search(query);
    let mut out = String::new();
    if found.is_empty() {
        let _ = writeln!(out, "No commands match '{query}'.");
        if let Some(suggestion) = registry.suggest(query) {
            let _ = writeln!(out, "Did you mean '{suggestion}'?");
        }
        return out;
    }
    let _ = writeln!(
        out,
        "{}",
        style(format!("{} command(s) matching '{query}':", found.len())).bold()
    );
    rows(&mut out, &found, "  ");
    out
}

/// Detailed help for one command.
pub fn command_help(cmd: &Command) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", style("Command:").bold(), style(cmd.full_name()).cyan());
    let _ = writeln!(out);
    match cmd.description() {
        "" => {
            let _ = writeln!(out, "  {NO_DESCRIPTION}");
        }
        description => {
            let _ = writeln!(out, "  {description}");
        }
    }
    if let Some(long) = cmd.long_description() {
        let _ = writeln!(out);
        for line in long.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    let _ = writeln!(out);

    let usage = cmd.usage().map(str::to_string).unwrap_or_else(|| {
        if cmd.accepts_args() {
            format!("tarn {} [args...]", cmd.full_name())
        } else {
            format!("tarn {}", cmd.full_name())
        }
    });
    let _ = writeln!(out, "{} {usage}", style("Usage:").bold());

    if !cmd.aliases().is_empty() {
        let _ = writeln!(out, "{} {}", style("Aliases:").bold(), cmd.aliases().join(", "));
    }
    if !cmd.dependencies().is_empty() {
        let _ = writeln!(out, "{} {}", style("Depends on:").bold(), cmd.dependencies().join(", "));
    }
    if let Some(category) = cmd.category() {
        let _ = writeln!(out, "{} {}", style("Category:").bold(), CategoryInfo::for_category(category).title);
    }
    if let Some(since) = cmd.since() {
        let _ = writeln!(out, "{} {since}", style("Since:").bold());
    }
    if let Some(message) = cmd.deprecated() {
        let _ = writeln!(out, "{}{}", WARN, style(format!("Deprecated: {message}")).yellow());
    }
    if !cmd.examples().is_empty() {
        let _ = writeln!(out, "\n{}", style("Examples:").bold());
        for example in cmd.examples() {
            let _ = writeln!(out, "  {example}");
        }
    }
    out
}

/// Help for every command in `namespace`, if it has any.
pub fn namespace_help(registry: &Registry, namespace: &str) -> Option<String> {
    let cmds = registry.list_by_namespace(namespace);
    if cmds.is_empty() {
        return None;
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({} commands)\n",
        style("Namespace:").bold(),
        style(namespace.to_lowercase()).cyan(),
        cmds.len()
    );
    rows(&mut out, &cmds, "  ");
    let _ = writeln!(out, "\nRun 'tarn -h {}:<method>' for details.", namespace.to_lowercase());
    Some(out)
}

/// Help for a command, falling back to namespace help.
pub fn help_for(registry: &Registry, name: &str) -> Result<String, CliError> {
    if let Some(cmd) = registry.get(name) {
        return Ok(command_help(&cmd));
    }
    if let Some(help) = namespace_help(registry, name) {
        return Ok(help);
    }
    Err(CliError::not_found(name, registry.suggest(name)))
}

/// Full usage with every category.
pub fn general_help(registry: &Registry) -> String {
    let mut out = banner();
    out.push_str("\nRun project commands with their dependencies.\n\n");
    let _ = writeln!(out, "{} tarn [options] <command> [args...]\n", style("Usage:").bold());

    let _ = writeln!(out, "{}", style("Options:").bold());
    for (flag, text) in [
        ("-l, -list", "List all commands"),
        ("-n, -namespace", "Group the list by namespace"),
        ("-search <query>", "Search commands"),
        ("-h, -help [command]", "Show help, or help for a command or namespace"),
        ("-version", "Show version information"),
        ("-init", "Create a starter tarnfile.rs"),
        ("-clean", "Remove compiled project commands"),
        ("-t, -timeout <dur>", "Timeout for external processes (default 10m)"),
        ("-v, -verbose", "More output (repeat for more)"),
        ("-debug", "Debug logging"),
        ("-C <dir>", "Run in another directory"),
        ("-json", "Print lists as JSON"),
    ] {
        let _ = writeln!(out, "  {flag:<22}{text}");
    }

    let categorized = registry.categorized();
    let total: usize = categorized.values().map(Vec::len).sum();
    let _ = writeln!(out, "\n{}", style(format!("Commands ({total}):")).bold());
    for category in registry.category_order() {
        let Some(cmds) = categorized.get(&category) else {
            continue;
        };
        let info = CategoryInfo::for_category(&category);
        let _ = writeln!(out, "\n  {}", style(info.title).underlined());
        rows(&mut out, cmds, "    ");
    }

    let _ = writeln!(out, "\n{}{}", BULB, style("Tips:").bold());
    let _ = writeln!(out, "  tarn -h <command>      detailed help");
    let _ = writeln!(out, "  tarn bench time=7s     pass key=value parameters");
    let _ = writeln!(out, "  tarn -init             add project commands in tarnfile.rs");
    out
}

/// Banner and a short list when no command is given.
pub fn quick_list(registry: &Registry) -> String {
    let mut out = banner();
    let quick: Vec<Arc<Command>> = QUICK_START.iter().filter_map(|name| registry.get(name)).collect();
    if !quick.is_empty() {
        let _ = writeln!(out, "\n{}", style("Quick start:").bold());
        rows(&mut out, &quick, "  ");
    }
    let user = registry.list_by_category(tarn_extension::USER_CATEGORY);
    if !user.is_empty() {
        let _ = writeln!(out, "\n{}", style("Project commands:").bold());
        rows(&mut out, &user, "  ");
    }
    let _ = writeln!(
        out,
        "\n{} commands available. Run 'tarn -l' for all of them or 'tarn -h' for help.",
        registry.list().len()
    );
    out
}

/// Version with build and platform details.
pub fn version(registry: &Registry) -> String {
    let metadata = registry.metadata();
    let user = metadata
        .categories
        .get(tarn_extension::USER_CATEGORY)
        .copied()
        .unwrap_or(0);
    let mut out = String::new();
    let _ = writeln!(out, "tarn {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "platform: {}/{}", std::env::consts::OS, std::env::consts::ARCH);
    let _ = writeln!(
        out,
        "build: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );
    let _ = writeln!(
        out,
        "commands: {} ({} built-in, {} project)",
        metadata.total_commands,
        metadata.total_commands - user,
        user
    );
    out
}

/// Command summaries as pretty JSON.
pub fn json(cmds: &[Arc<Command>]) -> Result<String, CliError> {
    let summaries: Vec<_> = cmds.iter().map(|c| c.summary()).collect();
    serde_json::to_string_pretty(&summaries).map_err(|e| CliError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_registry::CommandBuilder;

    fn registry() -> Registry {
        console::set_colors_enabled(false);
        let registry = Registry::new();
        registry.must_register(
            CommandBuilder::new("build")
                .description("Build the workspace")
                .category("build")
                .alias("b")
                .run(|| Ok(()))
                .must_build(),
        );
        registry.must_register(
            CommandBuilder::namespaced("build", "release")
                .description("Build with optimizations")
                .category("build")
                .run(|| Ok(()))
                .must_build(),
        );
        registry.must_register(
            CommandBuilder::namespaced("db", "migrate")
                .category("user")
                .usage("tarn db:migrate [steps=<n>]")
                .run_with_args(|_| Ok(()))
                .must_build(),
        );
        registry.must_register(
            CommandBuilder::new("secret")
                .hidden()
                .run(|| Ok(()))
                .must_build(),
        );
        registry
    }

    #[test]
    fn test_list_excludes_hidden() {
        let out = list(&registry());
        assert!(out.contains("Available commands (3)"));
        assert!(out.contains("build:release"));
        assert!(out.contains(NO_DESCRIPTION));
        assert!(!out.contains("secret"));
    }

    #[test]
    fn test_list_by_namespace_groups() {
        let out = list_by_namespace(&registry());
        let top = out.find("Top-level:").unwrap();
        let build = out.find("build:\n").unwrap();
        let db = out.find("db:\n").unwrap();
        assert!(top < build && build < db);
    }

    #[test]
    fn test_help_falls_back_to_namespace() {
        let reg = registry();
        let out = help_for(&reg, "db").unwrap();
        assert!(out.contains("Namespace: db (1 commands)"));

        let out = help_for(&reg, "b").unwrap();
        assert!(out.contains("Command: build"));
        assert!(out.contains("Aliases: b"));
        assert!(out.contains("Build & Compilation"));

        let out = help_for(&reg, "db:migrate").unwrap();
        assert!(out.contains("Usage: tarn db:migrate [steps=<n>]"));
    }

    #[test]
    fn test_help_for_unknown_suggests() {
        let err = help_for(&registry(), "biuld").unwrap_err();
        assert_eq!(err.code(), 6);
        assert!(err.to_string().contains("Did you mean 'build'?"));
    }

    #[test]
    fn test_search_without_results_suggests() {
        let out = search(&registry(), "relase");
        assert!(out.contains("No commands match 'relase'"));
        let out = search(&registry(), "optim");
        assert!(out.contains("build:release"));
    }

    #[test]
    fn test_version_counts_project_commands() {
        let out = version(&registry());
        assert!(out.contains("commands: 4 (3 built-in, 1 project)"));
    }

    #[test]
    fn test_general_help_orders_categories() {
        let out = general_help(&registry());
        let build = out.find("Build & Compilation").unwrap();
        let user = out.find("Project Commands").unwrap();
        assert!(build < user);
    }

    #[test]
    fn test_truncate_long_descriptions() {
        let long = "x".repeat(80);
        let cut = truncate(&long, DESCRIPTION_WIDTH);
        assert_eq!(cut.chars().count(), DESCRIPTION_WIDTH);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_json_lists_summaries() {
        let reg = registry();
        let out = json(&reg.list()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }
}
