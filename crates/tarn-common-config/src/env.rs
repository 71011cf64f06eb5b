//! Environment variable handling.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::duration::parse_duration;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load {path}: {source}")]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Environment variable names.
pub mod vars {
    pub const TARN_CONFIG: &str = "TARN_CONFIG";
    pub const TARN_TIMEOUT: &str = "TARN_TIMEOUT";
    pub const TARN_VERBOSE: &str = "TARN_VERBOSE";
    pub const TARN_DEBUG: &str = "TARN_DEBUG";
    pub const TARN_LOG_LEVEL: &str = "TARN_LOG_LEVEL";
    pub const TARN_LOG_FORMAT: &str = "TARN_LOG_FORMAT";
    pub const TARN_LOG_FILE: &str = "TARN_LOG_FILE";
    pub const NO_COLOR: &str = "NO_COLOR";
}

/// Process environment access.
pub struct Environment {
    loaded: Vec<PathBuf>,
}

impl Environment {
    /// Load `.env.local` and `.env` from `dir`.
    ///
    /// Existing process variables are never overwritten and `.env.local`
    /// wins over `.env`.
    pub fn init(dir: impl AsRef<Path>) -> Result<Self, EnvError> {
        let dir = dir.as_ref();
        let mut loaded = Vec::new();
        for name in [".env.local", ".env"] {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            dotenvy::from_path(&path).map_err(|source| EnvError::Dotenv {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "loaded environment file");
            loaded.push(path);
        }
        Ok(Self { loaded })
    }

    /// Files that were loaded, in load order.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Get an optional string variable; empty values count as unset.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    pub fn get_or(var: &str, default: &str) -> String {
        Self::get(var).unwrap_or_else(|| default.to_string())
    }

    /// Get a boolean variable (`1`, `true`, `yes` are true).
    pub fn get_bool(var: &str) -> Option<bool> {
        Self::get(var).map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    /// Whether a toggle variable is set to a true value.
    pub fn flag(var: &str) -> bool {
        Self::get_bool(var).unwrap_or(false)
    }

    /// Get a duration variable such as `TARN_TIMEOUT=30s`.
    pub fn get_duration(var: &str) -> Result<Option<Duration>, EnvError> {
        match Self::get(var) {
            Some(v) => parse_duration(&v)
                .map(Some)
                .map_err(|message| EnvError::InvalidValue {
                    var: var.to_string(),
                    message,
                }),
            None => Ok(None),
        }
    }
}
