//! Starter command file for `tarn -init`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::discovery::Discovery;
use crate::error::{ExtensionError, Result};

const STARTER: &str = r#"//! Project commands for tarn.
//!
//! Every `pub fn` taking no arguments or `&[String]` is a command. A
//! `pub struct` with an `impl` block of such methods becomes a namespace:
//! `tarn docker:up`.

use std::process::Command;

/// Short aliases: `tarn hi` runs `hello`.
pub const ALIASES: &[(&str, &str)] = &[("hi", "hello")];

/// Print a greeting
///
/// Pass `name=<who>` to greet someone else.
pub fn hello(args: &[String]) {
    let name = args
        .iter()
        .find_map(|arg| arg.strip_prefix("name="))
        .unwrap_or("world");
    println!("Hello, {name}!");
}

/// Container helpers
pub struct Docker;

impl Docker {
    /// Start the development containers
    pub fn up(&self) -> Result<(), String> {
        let status = Command::new("docker")
            .args(["compose", "up", "-d"])
            .status()
            .map_err(|e| e.to_string())?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("docker compose exited with {status}"))
        }
    }
}
"#;

/// Write a starter command file under `root`.
///
/// Fails with [`ExtensionError::AlreadyExists`] if either source location
/// is already present.
pub fn init(root: &Path, discovery: &Discovery) -> Result<PathBuf> {
    for existing in [discovery.dir_path(root), discovery.file_path(root)] {
        if existing.exists() {
            return Err(ExtensionError::AlreadyExists { path: existing });
        }
    }

    let path = discovery.file_path(root);
    std::fs::write(&path, STARTER).map_err(ExtensionError::io(&path))?;
    info!(path = %path.display(), "created command file");
    Ok(path)
}
