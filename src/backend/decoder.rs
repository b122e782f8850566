//! Payload decoding
//!
//! The sensor sends each value as a short decimal string. Anything that
//! does not parse is rejected and simply dropped by the caller.

use crate::types::Sample;
use thiserror::Error;

/// Why a payload was not turned into a sample
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("payload is empty")]
    Empty,

    #[error("payload {0:?} is not a number")]
    NotNumeric(String),
}

/// Stateless decoder for text notification payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelDecoder;

impl ChannelDecoder {
    /// Decode one payload for `channel`
    ///
    /// Surrounding whitespace and trailing NUL padding are ignored.
    pub fn decode(channel: &str, raw: &[u8]) -> Result<Sample, Rejected> {
        let text = std::str::from_utf8(raw).map_err(|_| Rejected::InvalidUtf8)?;
        let text = text.trim_end_matches('\0').trim();
        if text.is_empty() {
            return Err(Rejected::Empty);
        }

        text.parse::<f64>()
            .map(|value| Sample::new(channel, value))
            .map_err(|_| Rejected::NotNumeric(text.chars().take(32).collect()))
    }
}
