//! Configuration types for `.tarn/config.yaml`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::duration::{format_duration, parse_duration};

/// Default timeout for external processes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TarnConfig {
    /// Upper bound for every external process.
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    pub extensions: ExtensionsConfig,
    /// Where compiled extension projects live, relative to the project root.
    pub cache_dir: String,
    pub verbose: bool,
}

impl Default for TarnConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            extensions: ExtensionsConfig::default(),
            cache_dir: ".tarn/cache".to_string(),
            verbose: false,
        }
    }
}

/// Project command discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    pub enabled: bool,
    /// Directory of command sources; wins over `file` when both exist.
    pub dir: String,
    pub file: String,
    /// Cargo executable used to compile extensions.
    pub cargo: String,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "tarnfiles".to_string(),
            file: "tarnfile.rs".to_string(),
            cargo: "cargo".to_string(),
        }
    }
}

fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*value))
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
