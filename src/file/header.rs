//! File header and flags
//!
//! Layout:
//! - Magic (4 bytes): `SYBD`
//! - Version (u32 LE): 1
//! - Flags (u8)
//!
//! Flag bits:
//! - bit0: CHECKSUM, a 32-byte SHA-256 trailer follows the body
//! - bit1: JSON_BLOB, the body is JSON instead of compact binary
//!
//! Unknown bits are cleared on write and ignored on read.

use std::fmt;
use std::ops::BitOr;

use crate::codec::BodyKind;
use crate::errors::{SysdfError, SysdfResult};

/// Leading marker of every system file
pub const MAGIC: [u8; 4] = [0x53, 0x59, 0x42, 0x44];

/// The only format revision
pub const VERSION: u32 = 1;

/// Magic + version + flags
pub const HEADER_LEN: usize = 4 + 4 + 1;

/// Header flag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    /// No flags: compact body, no trailer
    pub const NONE: Flags = Flags(0);
    /// Append a SHA-256 trailer
    pub const CHECKSUM: Flags = Flags(0b0000_0001);
    /// Store the body as JSON
    pub const JSON_BLOB: Flags = Flags(0b0000_0010);

    const KNOWN_BITS: u8 = Self::CHECKSUM.0 | Self::JSON_BLOB.0;

    /// Wraps a raw flags byte, keeping unknown bits
    pub const fn from_bits_retain(bits: u8) -> Self {
        Flags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns the flags with unknown bits cleared
    pub const fn known(self) -> Self {
        Flags(self.0 & Self::KNOWN_BITS)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    /// Sets or clears `other` depending on `value`
    pub fn set(&mut self, other: Flags, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Body encoding selected by these flags
    pub fn body_kind(self) -> BodyKind {
        if self.contains(Flags::JSON_BLOB) {
            BodyKind::Json
        } else {
            BodyKind::Compact
        }
    }

    pub fn has_checksum(self) -> bool {
        self.contains(Flags::CHECKSUM)
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Flags::CHECKSUM) {
            names.push("CHECKSUM");
        }
        if self.contains(Flags::JSON_BLOB) {
            names.push("JSON_BLOB");
        }
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

/// Parsed file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Flags as stored, including unknown bits
    pub flags: Flags,
}

impl FileHeader {
    pub fn new(flags: Flags) -> Self {
        Self { flags }
    }

    /// Serializes the header. Unknown flag bits are written as zero.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&VERSION.to_le_bytes());
        buf[8] = self.flags.known().bits();
        buf
    }

    /// Returns true if `bytes` starts with the file magic
    pub fn has_magic(bytes: &[u8]) -> bool {
        bytes.len() >= MAGIC.len() && bytes[..MAGIC.len()] == MAGIC
    }

    /// Parses the header from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// - `SYSDF_TRUNCATED_HEADER` if fewer than [`HEADER_LEN`] bytes are present
    /// - `SYSDF_BAD_MAGIC` if the magic or version does not match
    pub fn parse(bytes: &[u8]) -> SysdfResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SysdfError::truncated_header(HEADER_LEN, bytes.len()));
        }

        if !Self::has_magic(bytes) {
            return Err(SysdfError::bad_magic("Invalid file header")
                .with_details(format!("magic {:02x?}", &bytes[..MAGIC.len()])));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != VERSION {
            return Err(SysdfError::bad_magic("Unsupported file version")
                .with_details(format!("version {}, expected {}", version, VERSION)));
        }

        Ok(Self {
            flags: Flags::from_bits_retain(bytes[8]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SysdfErrorCode;

    #[test]
    fn test_flag_bits() {
        assert_eq!(Flags::NONE.bits(), 0);
        assert_eq!(Flags::CHECKSUM.bits(), 0b01);
        assert_eq!(Flags::JSON_BLOB.bits(), 0b10);
        assert_eq!((Flags::CHECKSUM | Flags::JSON_BLOB).bits(), 0b11);
        assert_eq!(Flags::default(), Flags::NONE);
    }

    #[test]
    fn test_flags_set_and_remove() {
        let mut flags = Flags::NONE;
        flags.set(Flags::CHECKSUM, true);
        assert!(flags.has_checksum());
        flags.insert(Flags::JSON_BLOB);
        assert_eq!(flags.body_kind(), BodyKind::Json);
        flags.remove(Flags::CHECKSUM);
        assert!(!flags.has_checksum());
        flags.set(Flags::JSON_BLOB, false);
        assert_eq!(flags, Flags::NONE);
        assert_eq!(flags.body_kind(), BodyKind::Compact);
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(Flags::NONE.to_string(), "NONE");
        assert_eq!(
            (Flags::CHECKSUM | Flags::JSON_BLOB).to_string(),
            "CHECKSUM | JSON_BLOB"
        );
    }

    #[test]
    fn test_header_layout() {
        let bytes = FileHeader::new(Flags::CHECKSUM).to_bytes();
        assert_eq!(&bytes[0..4], b"SYBD");
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        assert_eq!(bytes[8], 0b01);
    }

    #[test]
    fn test_unknown_bits_cleared_on_write_kept_on_read() {
        let bytes = FileHeader::new(Flags::from_bits_retain(0b1000_0010)).to_bytes();
        assert_eq!(bytes[8], 0b10);

        let mut raw = bytes;
        raw[8] = 0b1111_0001;
        let header = FileHeader::parse(&raw).unwrap();
        assert!(header.flags.has_checksum());
        assert_eq!(header.flags.body_kind(), BodyKind::Compact);
        assert_eq!(header.flags.bits(), 0b1111_0001);
    }

    #[test]
    fn test_parse_truncated() {
        let bytes = FileHeader::new(Flags::NONE).to_bytes();
        for len in 0..HEADER_LEN {
            let err = FileHeader::parse(&bytes[..len]).unwrap_err();
            assert_eq!(err.code(), SysdfErrorCode::TruncatedHeader);
        }
    }

    #[test]
    fn test_parse_bad_magic_and_version() {
        let mut bytes = FileHeader::new(Flags::NONE).to_bytes();
        bytes[0] = b'X';
        assert_eq!(
            FileHeader::parse(&bytes).unwrap_err().code(),
            SysdfErrorCode::BadMagic
        );

        let mut bytes = FileHeader::new(Flags::NONE).to_bytes();
        bytes[4] = 2;
        let err = FileHeader::parse(&bytes).unwrap_err();
        assert_eq!(err.code(), SysdfErrorCode::BadMagic);
        assert!(err.message().contains("version"));
    }
}
