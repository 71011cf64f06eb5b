//! Project-defined commands for tarn.
//!
//! A project exports commands from `tarnfile.rs` or a `tarnfiles/`
//! directory. The loader parses the sources with `syn`, generates a small
//! cargo project that includes them as modules, compiles it once per
//! fingerprint and registers one command per exported function. Running
//! such a command spawns the compiled binary with the command name and
//! passes arguments through the parameter channel.

pub mod compile;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod harness;
pub mod loader;
pub mod parse;
pub mod scaffold;

pub use discovery::{Discovery, ExtensionSource, DEFAULT_DIR, DEFAULT_FILE};
pub use error::{ExtensionError, Result};
pub use loader::{Conflict, ExtensionLoader, LoadReport, LoaderOptions, Prepared, USER_CATEGORY};
pub use parse::{CommandDef, ParsedFile, Target};
pub use scaffold::init;
