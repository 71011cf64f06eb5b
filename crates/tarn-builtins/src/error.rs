use thiserror::Error;

/// A built-in rejected its parameters before starting a process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuiltinError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidParam {
        key: String,
        value: String,
        reason: String,
    },
}
