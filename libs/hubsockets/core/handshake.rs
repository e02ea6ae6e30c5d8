//! Handshake frame encoding
//!
//! The first frame on every connection is a compact JSON object naming the
//! wire protocol and its version, terminated by the ASCII record separator.

use crate::traits::Result;
use serde::Serialize;

/// Terminator appended to every handshake frame
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Wire protocol announced in the handshake
pub const PROTOCOL_NAME: &str = "json";

/// Handshake request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeRequest<'a> {
    pub protocol: &'a str,
    pub version: i64,
}

impl HandshakeRequest<'static> {
    pub fn new(version: i64) -> Self {
        HandshakeRequest {
            protocol: PROTOCOL_NAME,
            version,
        }
    }
}

impl HandshakeRequest<'_> {
    /// Compact JSON followed by the record separator
    pub fn encode(&self) -> Result<String> {
        let mut frame = serde_json::to_string(self)?;
        frame.push(RECORD_SEPARATOR);
        Ok(frame)
    }
}

/// Integer protocol version from a configured version string
///
/// The string is read as a decimal and truncated toward zero, so "1.5" gives
/// 1. Returns `None` when the string is not a number.
pub fn protocol_version_number(version: &str) -> Option<i64> {
    version
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
}
