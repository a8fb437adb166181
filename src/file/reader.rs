//! System file reader
//!
//! Opening a file only parses the header. The body is decoded on demand by
//! [`FileReader::to_system`], [`FileReader::name`] or [`FileReader::to_json`].
//!
//! Checksum verification is explicit. [`FileReader::verify`] reports a
//! missing trailer as `false` rather than an error; [`FileReader::verify_strict`]
//! turns anything but a matching trailer into `SYSDF_CHECKSUM_MISMATCH`.

use std::fs;
use std::path::Path;

use super::header::{FileHeader, Flags, HEADER_LEN};
use crate::checksum::{self, Verification, DIGEST_LEN};
use crate::codec::{self, BodyKind, Limits};
use crate::errors::{SysdfError, SysdfResult};
use crate::observability::Logger;
use crate::system::System;

/// Reader over an in-memory system file
#[derive(Debug, Clone)]
pub struct FileReader {
    header: FileHeader,
    data: Vec<u8>,
    /// Start of the body within `data`
    body_start: usize,
    /// End of the body (start of the trailer, if any)
    body_end: usize,
    limits: Limits,
}

impl FileReader {
    /// Parses the header of an encoded system file.
    ///
    /// # Errors
    ///
    /// - `SYSDF_TRUNCATED_HEADER` if the input is shorter than the header
    /// - `SYSDF_BAD_MAGIC` if the magic or version does not match
    pub fn open(bytes: impl Into<Vec<u8>>) -> SysdfResult<Self> {
        let data = bytes.into();
        let header = FileHeader::parse(&data)?;

        // A CHECKSUM file too short to hold a trailer has no trailer; the
        // remaining bytes are treated as body and will fail to decode.
        let body_end = if header.flags.has_checksum() && data.len() >= HEADER_LEN + DIGEST_LEN {
            data.len() - DIGEST_LEN
        } else {
            data.len()
        };

        Logger::trace(
            "SYSDF_FILE_OPENED",
            &[
                ("body_bytes", (body_end - HEADER_LEN).to_string().as_str()),
                ("flags", header.flags.to_string().as_str()),
            ],
        );

        Ok(Self {
            header,
            data,
            body_start: HEADER_LEN,
            body_end,
            limits: Limits::default(),
        })
    }

    /// Reads and parses a system file from disk.
    ///
    /// # Errors
    ///
    /// Returns `SYSDF_IO_ERROR` if the file cannot be read, otherwise the
    /// same errors as [`FileReader::open`].
    pub fn open_path(path: &Path) -> SysdfResult<Self> {
        let data = fs::read(path).map_err(|e| SysdfError::io_error_at_path(path, e))?;
        Self::open(data)
    }

    /// Opens a system file, or treats headerless input as a bare compact body.
    ///
    /// Input that does not start with the file magic (including input
    /// shorter than the header) is accepted as a compact body with no flags.
    /// A file that has the magic but an unsupported version still fails.
    pub fn open_or_bare(bytes: impl Into<Vec<u8>>) -> SysdfResult<Self> {
        let data = bytes.into();
        if FileHeader::has_magic(&data) {
            return Self::open(data);
        }

        Logger::info(
            "SYSDF_BARE_BODY",
            &[("bytes", data.len().to_string().as_str())],
        );

        let body_end = data.len();
        Ok(Self {
            header: FileHeader::new(Flags::NONE),
            data,
            body_start: 0,
            body_end,
            limits: Limits::default(),
        })
    }

    /// Override the decode limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Flags as stored, including unknown bits
    pub fn flags(&self) -> Flags {
        self.header.flags
    }

    pub fn body_kind(&self) -> BodyKind {
        self.header.flags.body_kind()
    }

    pub fn has_checksum(&self) -> bool {
        self.header.flags.has_checksum()
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.data[self.body_start..self.body_end]
    }

    /// Stored checksum trailer, if the flag is set and one is present
    pub fn trailer(&self) -> Option<&[u8]> {
        if self.has_checksum() && self.body_end < self.data.len() {
            Some(&self.data[self.body_end..])
        } else {
            None
        }
    }

    /// Returns the system name.
    ///
    /// Compact bodies only decode the leading name field; JSON bodies are
    /// parsed in full.
    pub fn name(&self) -> SysdfResult<String> {
        codec::decode_name(self.body(), self.body_kind(), &self.limits)
    }

    /// Checks the trailer against the body
    pub fn verification(&self) -> Verification {
        let result = checksum::verify(self.flags().bits(), self.body(), self.trailer());
        if result == Verification::Mismatch {
            Logger::warn(
                "SYSDF_CHECKSUM_MISMATCH",
                &[("body_bytes", self.body().len().to_string().as_str())],
            );
        }
        result
    }

    /// Returns true only if a checksum is present and matches.
    ///
    /// A file without checksum returns `false`; this is not an error.
    pub fn verify(&self) -> bool {
        self.verification().is_valid()
    }

    /// Verifies the checksum, failing if it is missing or wrong.
    ///
    /// # Errors
    ///
    /// Returns `SYSDF_CHECKSUM_MISMATCH` on mismatch or when the file has
    /// no checksum trailer.
    pub fn verify_strict(&self) -> SysdfResult<()> {
        match self.verification() {
            Verification::Valid => Ok(()),
            Verification::Mismatch => Err(SysdfError::checksum_mismatch(
                "Checksum does not match file body",
            )),
            Verification::NotApplicable => Err(SysdfError::checksum_mismatch(
                "File has no checksum trailer",
            )
            .with_details(format!("flags {}", self.flags()))),
        }
    }

    /// Fully decodes the system
    pub fn to_system(&self) -> SysdfResult<System> {
        codec::decode(self.body(), self.body_kind(), &self.limits)
    }

    /// Returns the system as JSON.
    ///
    /// Compact bodies are decoded and re-encoded. JSON bodies are validated
    /// and returned as stored.
    pub fn to_json(&self) -> SysdfResult<String> {
        match self.body_kind() {
            BodyKind::Json => {
                self.to_system()?;
                String::from_utf8(self.body().to_vec()).map_err(|e| {
                    SysdfError::malformed_body("JSON body is not valid UTF-8")
                        .with_details(e.to_string())
                })
            }
            BodyKind::Compact => {
                let system = self.to_system()?;
                let json = codec::encode(&system, BodyKind::Json)?;
                String::from_utf8(json).map_err(|e| {
                    SysdfError::malformed_body("Encoded JSON is not valid UTF-8")
                        .with_details(e.to_string())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SysdfErrorCode;
    use crate::file::FileWriter;
    use crate::system::Member;
    use tempfile::TempDir;

    fn example() -> System {
        System::with_members(
            "PluralKit Example System",
            vec![
                Member::new("Myriad Kit", "they/them"),
                Member::new("Second Member", "she/her"),
            ],
        )
    }

    fn write(system: &System, flags: Flags) -> Vec<u8> {
        FileWriter::new(system).with_flags(flags).to_bytes().unwrap()
    }

    #[test]
    fn test_roundtrip_all_flag_combinations() {
        let system = example();
        for flags in [
            Flags::NONE,
            Flags::CHECKSUM,
            Flags::JSON_BLOB,
            Flags::CHECKSUM | Flags::JSON_BLOB,
        ] {
            let reader = FileReader::open(write(&system, flags)).unwrap();
            assert_eq!(reader.flags(), flags);
            assert_eq!(reader.to_system().unwrap(), system);
            assert_eq!(reader.name().unwrap(), "PluralKit Example System");
            assert_eq!(reader.verify(), flags.has_checksum());
        }
    }

    #[test]
    fn test_open_truncated_header() {
        let bytes = write(&example(), Flags::NONE);
        let err = FileReader::open(&bytes[..HEADER_LEN - 1]).unwrap_err();
        assert_eq!(err.code(), SysdfErrorCode::TruncatedHeader);

        let err = FileReader::open(Vec::new()).unwrap_err();
        assert_eq!(err.code(), SysdfErrorCode::TruncatedHeader);
    }

    #[test]
    fn test_open_bad_magic() {
        let mut bytes = write(&example(), Flags::NONE);
        bytes[1] = 0;
        let err = FileReader::open(bytes).unwrap_err();
        assert_eq!(err.code(), SysdfErrorCode::BadMagic);
    }

    #[test]
    fn test_single_byte_flip_detected() {
        let bytes = write(&example(), Flags::CHECKSUM);
        assert!(FileReader::open(bytes.clone()).unwrap().verify());

        let body_end = bytes.len() - DIGEST_LEN;
        for i in HEADER_LEN..body_end {
            let mut corrupted = bytes.clone();
            corrupted[i] ^= 0x01;
            let reader = FileReader::open(corrupted).unwrap();
            assert!(!reader.verify(), "flip at {} not detected", i);
            assert_eq!(
                reader.verify_strict().unwrap_err().code(),
                SysdfErrorCode::ChecksumMismatch
            );
        }
    }

    #[test]
    fn test_absent_checksum_is_not_an_error() {
        let reader = FileReader::open(write(&example(), Flags::NONE)).unwrap();
        assert!(!reader.verify());
        assert_eq!(reader.verification(), Verification::NotApplicable);

        let err = reader.verify_strict().unwrap_err();
        assert_eq!(err.code(), SysdfErrorCode::ChecksumMismatch);
        assert!(err.message().contains("no checksum"));
    }

    #[test]
    fn test_checksum_flag_without_room_for_trailer() {
        let mut bytes = FileWriter::new(&System::new(""))
            .to_bytes()
            .unwrap();
        bytes[8] = Flags::CHECKSUM.bits();

        let reader = FileReader::open(bytes).unwrap();
        assert_eq!(reader.verification(), Verification::NotApplicable);
        assert!(!reader.verify());
    }

    #[test]
    fn test_unknown_flag_bits_ignored() {
        let mut bytes = write(&example(), Flags::CHECKSUM);
        bytes[8] |= 0b1000_0000;
        let reader = FileReader::open(bytes).unwrap();
        assert_eq!(reader.body_kind(), BodyKind::Compact);
        assert_eq!(reader.to_system().unwrap(), example());
        // The digest covers the flags byte as written
        assert!(!reader.verify());
    }

    #[test]
    fn test_to_json_same_for_both_body_kinds() {
        let system = example();
        let from_json = FileReader::open(write(&system, Flags::JSON_BLOB))
            .unwrap()
            .to_json()
            .unwrap();
        let from_compact = FileReader::open(write(&system, Flags::CHECKSUM))
            .unwrap()
            .to_json()
            .unwrap();

        let a: serde_json::Value = serde_json::from_str(&from_json).unwrap();
        let b: serde_json::Value = serde_json::from_str(&from_compact).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["members"][0]["name"], "Myriad Kit");
    }

    #[test]
    fn test_to_json_rejects_invalid_json_body() {
        let mut bytes = write(&example(), Flags::JSON_BLOB);
        let last = bytes.len() - 1;
        bytes[last] = b'x';
        let reader = FileReader::open(bytes).unwrap();
        assert_eq!(reader.to_json().unwrap_err().code(), SysdfErrorCode::MalformedBody);
    }

    #[test]
    fn test_truncated_body_never_panics() {
        for flags in [Flags::NONE, Flags::JSON_BLOB, Flags::CHECKSUM] {
            let bytes = write(&example(), flags);
            for len in 0..bytes.len() {
                match FileReader::open(&bytes[..len]) {
                    Ok(reader) => {
                        let _ = reader.verify();
                        let _ = reader.name();
                        let _ = reader.to_json();
                        if !flags.has_checksum() {
                            assert_eq!(
                                reader.to_system().unwrap_err().code(),
                                SysdfErrorCode::MalformedBody
                            );
                        }
                    }
                    Err(err) => assert_eq!(err.code(), SysdfErrorCode::TruncatedHeader),
                }
            }
        }
    }

    #[test]
    fn test_limits_apply() {
        let reader = FileReader::open(write(&example(), Flags::NONE))
            .unwrap()
            .with_limits(Limits {
                max_members: 1,
                ..Limits::default()
            });
        assert_eq!(reader.to_system().unwrap_err().code(), SysdfErrorCode::MalformedBody);
    }

    #[test]
    fn test_open_or_bare() {
        let system = example();
        let body = codec::encode(&system, BodyKind::Compact).unwrap();

        let reader = FileReader::open_or_bare(body.clone()).unwrap();
        assert_eq!(reader.flags(), Flags::NONE);
        assert_eq!(reader.body(), &body[..]);
        assert_eq!(reader.to_system().unwrap(), system);

        let framed = FileReader::open_or_bare(write(&system, Flags::CHECKSUM)).unwrap();
        assert!(framed.verify());

        let empty = FileReader::open_or_bare(Vec::new()).unwrap();
        assert_eq!(empty.to_system().unwrap_err().code(), SysdfErrorCode::MalformedBody);
    }

    #[test]
    fn test_open_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system.sysdf");
        let system = example();
        FileWriter::new(&system)
            .with_flags(Flags::CHECKSUM | Flags::JSON_BLOB)
            .write_to_path(&path)
            .unwrap();

        let reader = FileReader::open_path(&path).unwrap();
        assert!(reader.verify());
        assert_eq!(reader.to_system().unwrap(), system);

        let err = FileReader::open_path(&temp_dir.path().join("missing.sysdf")).unwrap_err();
        assert_eq!(err.code(), SysdfErrorCode::IoError);
    }
}
