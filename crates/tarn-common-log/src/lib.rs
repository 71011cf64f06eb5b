//! Logging infrastructure for tarn.
//!
//! Diagnostics always go to stderr so command output on stdout stays clean.

use std::io;
use std::path::PathBuf;

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Log file path (if file logging enabled).
    pub file_path: Option<PathBuf>,
    /// Include source location.
    pub source_location: bool,
    /// Colorize stderr output.
    pub ansi: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
            LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO,
            LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        }
    }
}

impl LogLevel {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Single-line format.
    #[default]
    Compact,
    /// JSON structured format.
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            file_path: None,
            source_location: false,
            ansi: true,
        }
    }
}

fn env_flag(var: &str) -> bool {
    std::env::var(var)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

impl LogConfig {
    /// Create config from `TARN_LOG_*`, `TARN_VERBOSE`, `TARN_DEBUG` and
    /// `NO_COLOR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("TARN_LOG_LEVEL") {
            if let Some(l) = LogLevel::parse(&level) {
                config.level = l;
            }
        }
        if env_flag("TARN_VERBOSE") {
            config.level = config.level.min(LogLevel::Info);
        }
        if env_flag("TARN_DEBUG") {
            config.level = config.level.min(LogLevel::Debug);
            config.source_location = true;
        }

        if let Ok(format) = std::env::var("TARN_LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }

        if let Ok(file_path) = std::env::var("TARN_LOG_FILE") {
            if !file_path.trim().is_empty() {
                config.file_path = Some(PathBuf::from(file_path));
            }
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.ansi = false;
        }

        config
    }

    /// Lower the level for `-v` flags: one step per occurrence.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let level = match verbose {
            0 => return self,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
        self.level = self.level.min(level);
        self
    }

    /// `-debug`: debug level with source locations.
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.level = self.level.min(LogLevel::Debug);
            self.source_location = true;
        }
        self
    }

    /// Filter directive: `RUST_LOG` wins when set, otherwise the level.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn stderr_layer(config: &LogConfig) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_file(config.source_location)
        .with_line_number(config.source_location);
    match config.format {
        LogFormat::Pretty => layer.pretty().with_ansi(config.ansi).boxed(),
        LogFormat::Compact => layer
            .compact()
            .without_time()
            .with_target(config.source_location)
            .with_ansi(config.ansi)
            .boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

fn file_layer(config: &LogConfig, file: std::fs::File) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_file(config.source_location)
        .with_line_number(config.source_location);
    match config.format {
        LogFormat::Json => layer.json().boxed(),
        _ => layer.boxed(),
    }
}

/// Initialize logging with the given configuration.
pub fn init(config: LogConfig) -> Result<(), LogError> {
    let mut layers = vec![stderr_layer(&config)];

    if let Some(file_path) = &config.file_path {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        layers.push(file_layer(&config, file));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(config.filter())
        .try_init()
        .map_err(|e| LogError::InitError(e.to_string()))
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to initialize logging: {0}")]
    InitError(String),

    #[error("failed to open log file: {0}")]
    FileError(#[from] io::Error),
}
