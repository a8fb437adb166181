//! Body codecs for system files
//!
//! A system is stored in one of two body encodings:
//!
//! - [`BodyKind::Compact`]: length-prefixed binary layout
//! - [`BodyKind::Json`]: UTF-8 JSON object
//!
//! Both satisfy `decode(encode(s, k), k) == s`. Member order is preserved
//! exactly; decoding never sorts.
//!
//! Decoding is bounded by [`Limits`] so that corrupt or hostile input cannot
//! trigger unbounded allocation.

mod compact;
mod json;

use serde::{Deserialize, Serialize};

use crate::errors::SysdfResult;
use crate::system::System;

/// Default maximum number of members accepted by the decoder
pub const DEFAULT_MAX_MEMBERS: u32 = 65_536;

/// Default maximum length in bytes of a single string field
pub const DEFAULT_MAX_STRING_LEN: u32 = 1024 * 1024;

/// Body encoding selected by the `JSON_BLOB` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Length-prefixed binary body
    Compact,
    /// JSON object body
    Json,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Compact => "compact",
            BodyKind::Json => "json",
        }
    }
}

impl std::fmt::Display for BodyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upper bounds enforced while decoding a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum member count (default: 65536)
    #[serde(default = "default_max_members")]
    pub max_members: u32,

    /// Maximum length of any string field in bytes (default: 1 MiB)
    #[serde(default = "default_max_string_len")]
    pub max_string_len: u32,
}

fn default_max_members() -> u32 {
    DEFAULT_MAX_MEMBERS
}

fn default_max_string_len() -> u32 {
    DEFAULT_MAX_STRING_LEN
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_members: default_max_members(),
            max_string_len: default_max_string_len(),
        }
    }
}

/// Encodes a system into a body of the given kind.
///
/// # Errors
///
/// Returns `SYSDF_MALFORMED_BODY` if a compact length field would overflow
/// its `u32` prefix.
pub fn encode(system: &System, kind: BodyKind) -> SysdfResult<Vec<u8>> {
    match kind {
        BodyKind::Compact => compact::encode(system),
        BodyKind::Json => json::encode(system),
    }
}

/// Decodes a body of the given kind into a system.
///
/// # Errors
///
/// Returns `SYSDF_MALFORMED_BODY` if the body is truncated, exceeds
/// `limits`, is not valid UTF-8, or (for JSON) lacks required fields.
pub fn decode(body: &[u8], kind: BodyKind, limits: &Limits) -> SysdfResult<System> {
    match kind {
        BodyKind::Compact => compact::decode(body, limits),
        BodyKind::Json => json::decode(body, limits),
    }
}

/// Extracts the system name from a body.
///
/// Compact bodies only read the leading name field. JSON bodies are parsed
/// in full.
pub fn decode_name(body: &[u8], kind: BodyKind, limits: &Limits) -> SysdfResult<String> {
    match kind {
        BodyKind::Compact => compact::decode_name(body, limits),
        BodyKind::Json => json::decode(body, limits).map(|system| system.name().to_string()),
    }
}
