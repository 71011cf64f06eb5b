//! Parameter threading for tarn commands.
//!
//! Trailing CLI tokens reach a compiled command body through the
//! [`ARGS_ENV`] environment variable. The runner writes it with
//! [`apply`], the body reads it back with [`read_args`], and
//! [`Params`] offers `key=value` / flag parsing on top of the raw tokens.

mod channel;
mod error;
mod params;

pub use channel::{apply, decode, encode, read_args, read_from, ChannelValue, ARGS_ENV, MAX_CHANNEL_BYTES};
pub use error::ChannelError;
pub use params::Params;
