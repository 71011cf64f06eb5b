use thiserror::Error;

/// Reasons the parameter channel cannot carry a token list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("argument {index} contains a NUL byte and cannot be passed through the environment")]
    NulByte { index: usize },

    #[error("encoded arguments are {len} bytes, over the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("malformed argument channel: {reason}")]
    Malformed { reason: String },
}
