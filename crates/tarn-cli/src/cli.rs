//! Command-line arguments.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tarn_common_config::parse_duration;

/// tarn - run project commands with dependencies
#[derive(Debug, Default, Parser)]
#[command(
    name = "tarn",
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// List all commands
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Group listed commands by namespace
    #[arg(short = 'n', long)]
    pub namespace: bool,

    /// Search commands by name and description
    #[arg(long, value_name = "QUERY")]
    pub search: Option<String>,

    /// Print lists as JSON
    #[arg(long)]
    pub json: bool,

    /// Show help, or help for a command
    #[arg(short = 'h', long)]
    pub help: bool,

    /// Show version information
    #[arg(long)]
    pub version: bool,

    /// Create a starter tarnfile.rs
    #[arg(long)]
    pub init: bool,

    /// Remove compiled project commands
    #[arg(long)]
    pub clean: bool,

    /// Timeout for every external process (e.g. 30s, 5m)
    #[arg(short = 't', long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Debug logging with source locations
    #[arg(long)]
    pub debug: bool,

    /// Run as if started in DIR
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Command to run
    pub command: Option<String>,

    /// Arguments for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Long flags that may also be written with a single dash.
const LONG_FLAGS: &[&str] = &[
    "list", "namespace", "search", "json", "help", "version", "init", "clean", "timeout",
    "verbose", "debug", "directory",
];

/// Flags whose value is the following token.
const VALUE_FLAGS: &[&str] = &["--search", "--timeout", "--directory", "-t", "-C"];

/// Rewrite `argv` for clap.
///
/// Before the command name, single-dash long flags (`-list`) become their
/// `--` form. Everything after the command name is passed through untouched
/// behind a `--` separator, so command arguments are never read as tool
/// flags.
pub fn normalize_args<I, T>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut argv = argv.into_iter().map(Into::into);
    let mut out: Vec<OsString> = argv.next().into_iter().collect();
    let mut expect_value = false;

    while let Some(arg) = argv.next() {
        if expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }

        let Some(text) = arg.to_str().map(str::to_string) else {
            out.push(arg);
            continue;
        };

        if text == "--" {
            out.push(arg);
            out.extend(argv.by_ref());
            break;
        }

        if !text.starts_with('-') || text == "-" {
            out.push(arg);
            out.push(OsString::from("--"));
            out.extend(argv.by_ref());
            break;
        }

        let flag = long_form(&text);
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, _)) => (name.to_string(), true),
            None => (flag.clone(), false),
        };
        expect_value = !inline_value && VALUE_FLAGS.contains(&name.as_str());
        out.push(OsString::from(flag));
    }

    out
}

fn long_form(arg: &str) -> String {
    if arg.starts_with("--") || arg.len() <= 2 {
        return arg.to_string();
    }
    let body = &arg[1..];
    let name = body.split_once('=').map_or(body, |(name, _)| name);
    if LONG_FLAGS.contains(&name) {
        format!("-{arg}")
    } else {
        arg.to_string()
    }
}

/// Canonical command name: lowercase with `.` written as `:`.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace('.', ":")
}

impl Cli {
    /// Parse from `argv` after normalisation.
    pub fn parse_normalized<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(argv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tarn"];
        argv.extend_from_slice(args);
        Cli::parse_normalized(argv).unwrap()
    }

    #[test_case(&["-list"] ; "single dash")]
    #[test_case(&["--list"] ; "double dash")]
    #[test_case(&["-l"] ; "short")]
    fn test_list_forms(args: &[&str]) {
        assert!(parse(args).list);
    }

    #[test]
    fn test_list_and_namespace_combined() {
        let cli = parse(&["-l", "-n"]);
        assert!(cli.list && cli.namespace);
        let cli = parse(&["-ln"]);
        assert!(cli.list && cli.namespace);
    }

    #[test]
    fn test_single_dash_value_flags() {
        let cli = parse(&["-search", "lint", "-timeout", "30s"]);
        assert_eq!(cli.search.as_deref(), Some("lint"));
        assert_eq!(cli.timeout, Some(Duration::from_secs(30)));

        let cli = parse(&["-t", "2m", "-C", "/tmp", "build"]);
        assert_eq!(cli.timeout, Some(Duration::from_secs(120)));
        assert_eq!(cli.directory, Some(PathBuf::from("/tmp")));
        assert_eq!(cli.command.as_deref(), Some("build"));
    }

    #[test]
    fn test_arguments_after_command_are_untouched() {
        let cli = parse(&["-v", "bench", "time=7s", "-list", "--release", "-v"]);
        assert_eq!(cli.verbose, 1);
        assert!(!cli.list);
        assert_eq!(cli.command.as_deref(), Some("bench"));
        assert_eq!(cli.args, ["time=7s", "-list", "--release", "-v"]);
    }

    #[test]
    fn test_search_value_is_not_a_command() {
        let cli = parse(&["-search", "build"]);
        assert_eq!(cli.search.as_deref(), Some("build"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_help_and_version_flags() {
        assert!(parse(&["-help"]).help);
        assert!(parse(&["-h", "build"]).help);
        assert!(parse(&["-version"]).version);
        assert!(parse(&["-debug", "-init"]).debug);
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        assert!(Cli::parse_normalized(["tarn", "-t", "soon"]).is_err());
    }

    #[test_case("build.release", "build:release" ; "dot to colon")]
    #[test_case("Build:Release", "build:release" ; "lowercase")]
    #[test_case("deploy-staging", "deploy-staging" ; "hyphen kept")]
    fn test_normalize_name(input: &str, expected: &str) {
        assert_eq!(normalize_name(input), expected);
    }
}
