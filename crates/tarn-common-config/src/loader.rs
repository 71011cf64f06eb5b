//! Configuration file loading and parsing.

use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::env::{vars, EnvError, Environment};
use crate::types::TarnConfig;

/// Project-relative location of the configuration file.
pub const CONFIG_FILE: &str = ".tarn/config.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
    explicit: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
            explicit: None,
        }
    }

    /// Load from `path` instead of the conventional location. The file
    /// must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Path that [`load`](Self::load) reads.
    pub fn config_path(&self) -> PathBuf {
        match &self.explicit {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.base_path.join(path),
            None => self.base_path.join(CONFIG_FILE),
        }
    }

    /// Load the file (defaults when the conventional file is absent),
    /// then apply environment overrides and validate.
    pub fn load(&self) -> Result<TarnConfig, ConfigError> {
        let mut config = self.load_file()?;
        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;
        Ok(config)
    }

    fn load_file(&self) -> Result<TarnConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            if self.explicit.is_some() {
                return Err(ConfigError::NotFound { path: config_path });
            }
            return Ok(TarnConfig::default());
        }

        debug!(path = %config_path.display(), "loading config");
        let contents = std::fs::read_to_string(&config_path)?;
        let expanded = self.expand_env_vars(&contents)?;

        if expanded.trim().is_empty() {
            return Ok(TarnConfig::default());
        }

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").map_err(|e| {
            ConfigError::ValidationError {
                message: e.to_string(),
            }
        })?;

        let mut result = String::with_capacity(content.len());
        let mut last = 0;
        for cap in re.captures_iter(content) {
            let Some(full_match) = cap.get(0) else {
                continue;
            };
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result.push_str(&content[last..full_match.start()]);
            result.push_str(&value);
            last = full_match.end();
        }
        result.push_str(&content[last..]);

        Ok(result)
    }

    fn apply_env_overrides(&self, config: &mut TarnConfig) -> Result<(), ConfigError> {
        if let Some(timeout) = Environment::get_duration(vars::TARN_TIMEOUT)? {
            config.timeout = timeout;
        }
        if let Some(verbose) = Environment::get_bool(vars::TARN_VERBOSE) {
            config.verbose = verbose;
        }
        Ok(())
    }

    /// Validate configuration values.
    fn validate(&self, config: &TarnConfig) -> Result<(), ConfigError> {
        if config.timeout.is_zero() {
            return Err(ConfigError::ValidationError {
                message: "timeout must be greater than 0".to_string(),
            });
        }

        if config.extensions.dir.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "extensions.dir must not be empty".to_string(),
            });
        }

        if !config.extensions.file.ends_with(".rs") {
            return Err(ConfigError::ValidationError {
                message: "extensions.file must name a .rs file".to_string(),
            });
        }

        if config.extensions.cargo.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "extensions.cargo must not be empty".to_string(),
            });
        }

        if config.cache_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "cache_dir must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to the conventional location.
    pub fn save(&self, config: &TarnConfig) -> Result<PathBuf, ConfigError> {
        let config_path = self.base_path.join(CONFIG_FILE);
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(&config_path, yaml)?;
        Ok(config_path)
    }
}
