//! The `TARN_ARGS` environment channel.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::process::Command;

use tracing::warn;

use crate::error::ChannelError;

/// Environment variable carrying invocation arguments to a command body.
pub const ARGS_ENV: &str = "TARN_ARGS";

/// Largest encoded payload accepted. Linux refuses single environment
/// strings above 128 KiB.
pub const MAX_CHANNEL_BYTES: usize = 128 * 1024;

/// What [`apply`] did to the child's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelValue {
    /// The channel was set to this encoded payload.
    Set(String),
    /// The channel was removed; the body sees no parameters.
    Cleared,
}

fn is_plain(token: &str) -> bool {
    !token.is_empty()
        && token.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '-' | '_' | '=' | '.' | '/' | ':' | ',' | '+' | '@' | '%')
        })
}

/// Encode tokens for the channel.
///
/// Plain tokens such as `verbose`, `time=5s` or `package=./pkg` are written
/// verbatim; anything else is POSIX-shell quoted so [`decode`] restores it
/// exactly.
pub fn encode<S: AsRef<str>>(tokens: &[S]) -> Result<String, ChannelError> {
    let mut parts: Vec<Cow<'_, str>> = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if token.contains('\0') {
            return Err(ChannelError::NulByte { index });
        }
        parts.push(if is_plain(token) {
            Cow::Borrowed(token)
        } else {
            shell_words::quote(token)
        });
    }

    let encoded = parts.join(" ");
    if encoded.len() > MAX_CHANNEL_BYTES {
        return Err(ChannelError::TooLarge {
            len: encoded.len(),
            max: MAX_CHANNEL_BYTES,
        });
    }
    Ok(encoded)
}

/// Split a channel payload back into tokens.
pub fn decode(raw: &str) -> Result<Vec<String>, ChannelError> {
    shell_words::split(raw).map_err(|e| ChannelError::Malformed {
        reason: e.to_string(),
    })
}

/// Write `tokens` into the environment of `cmd`.
///
/// An unwritable token list clears the channel instead, so the child runs
/// with zero parameters rather than inheriting a stale value.
pub fn apply<S: AsRef<str>>(cmd: &mut Command, tokens: &[S]) -> ChannelValue {
    let value = match encode(tokens) {
        Ok(encoded) if encoded.is_empty() => ChannelValue::Cleared,
        Ok(encoded) => ChannelValue::Set(encoded),
        Err(e) => {
            warn!(error = %e, "cannot pass arguments to command; running without parameters");
            ChannelValue::Cleared
        }
    };

    match &value {
        ChannelValue::Set(encoded) => cmd.env(ARGS_ENV, OsStr::new(encoded)),
        ChannelValue::Cleared => cmd.env_remove(ARGS_ENV),
    };
    value
}

/// Tokens from a raw channel value.
///
/// An absent or blank channel yields `fallback`. A malformed channel is
/// logged and split on whitespace.
pub fn read_from(raw: Option<&str>, fallback: &[String]) -> Vec<String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return fallback.to_vec(),
        Some(raw) => raw,
    };
    match decode(raw) {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "falling back to whitespace splitting");
            raw.split_whitespace().map(str::to_string).collect()
        }
    }
}

/// Tokens from the process environment, or `fallback` when unset.
pub fn read_args(fallback: &[String]) -> Vec<String> {
    let raw = std::env::var(ARGS_ENV).ok();
    read_from(raw.as_deref(), fallback)
}
