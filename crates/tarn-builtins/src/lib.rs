//! Built-in commands for tarn.
//!
//! Each built-in is a row in [`CATALOG`]: a name, display metadata,
//! dependencies and a body that turns its parameters into a cargo or git
//! invocation. Bodies run processes through the context's
//! [`CommandRunner`](tarn_exec::CommandRunner), so tests can record the
//! command lines instead of spawning them.

mod cargo;
mod catalog;
mod context;
mod error;
mod git;

pub use catalog::{register_all, Builtin, CATALOG};
pub use context::BuiltinContext;
pub use error::BuiltinError;
