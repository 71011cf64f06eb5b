//! Configuration for tarn.
//!
//! Settings come from `.tarn/config.yaml` (or the file named by
//! `TARN_CONFIG`), with `${VAR}` / `${VAR:-default}` expansion, and are then
//! overridden by `TARN_*` environment variables.

pub mod duration;
pub mod env;
pub mod loader;
pub mod types;

pub use duration::{format_duration, parse_duration};
pub use env::{vars, EnvError, Environment};
pub use loader::{ConfigError, ConfigLoader, CONFIG_FILE};
pub use types::{ExtensionsConfig, TarnConfig};
