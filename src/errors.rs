//! Error types shared by every sysdf module
//!
//! Error codes:
//! - SYSDF_BAD_MAGIC
//! - SYSDF_TRUNCATED_HEADER
//! - SYSDF_MALFORMED_BODY
//! - SYSDF_OUT_OF_RANGE
//! - SYSDF_CHECKSUM_MISMATCH
//! - SYSDF_IO_ERROR
//!
//! Every failure carries a stable code plus a human-readable message and an
//! optional detail string. Callers that present errors to users should match
//! on [`SysdfErrorCode`], never on the message text.

use std::fmt;
use std::io;
use std::path::Path;

/// Stable error kinds for system files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SysdfErrorCode {
    /// Leading marker or format version does not match
    BadMagic,
    /// Fewer bytes than the fixed header length
    TruncatedHeader,
    /// Body could not be decoded (bad length prefix, absurd count, invalid JSON)
    MalformedBody,
    /// Member index past the end of the member list
    OutOfRange,
    /// Strict verification failed
    ChecksumMismatch,
    /// Storage read or write failure
    IoError,
}

impl SysdfErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SysdfErrorCode::BadMagic => "SYSDF_BAD_MAGIC",
            SysdfErrorCode::TruncatedHeader => "SYSDF_TRUNCATED_HEADER",
            SysdfErrorCode::MalformedBody => "SYSDF_MALFORMED_BODY",
            SysdfErrorCode::OutOfRange => "SYSDF_OUT_OF_RANGE",
            SysdfErrorCode::ChecksumMismatch => "SYSDF_CHECKSUM_MISMATCH",
            SysdfErrorCode::IoError => "SYSDF_IO_ERROR",
        }
    }

    /// Returns true if the error was caused by the input bytes rather than
    /// the environment or the caller.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            SysdfErrorCode::BadMagic
                | SysdfErrorCode::TruncatedHeader
                | SysdfErrorCode::MalformedBody
                | SysdfErrorCode::ChecksumMismatch
        )
    }
}

impl fmt::Display for SysdfErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error type with full context
#[derive(Debug)]
pub struct SysdfError {
    /// Error code
    code: SysdfErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl SysdfError {
    fn new(code: SysdfErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a bad magic error
    pub fn bad_magic(message: impl Into<String>) -> Self {
        Self::new(SysdfErrorCode::BadMagic, message)
    }

    /// Create a truncated header error
    pub fn truncated_header(expected: usize, actual: usize) -> Self {
        Self::new(
            SysdfErrorCode::TruncatedHeader,
            format!("Header truncated: expected {} bytes, got {}", expected, actual),
        )
    }

    /// Create a malformed body error
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::new(SysdfErrorCode::MalformedBody, message)
    }

    /// Create an out of range error for a member index
    pub fn out_of_range(index: usize, count: usize) -> Self {
        Self::new(
            SysdfErrorCode::OutOfRange,
            format!("Member index {} out of range (member count {})", index, count),
        )
    }

    /// Create a checksum mismatch error
    pub fn checksum_mismatch(message: impl Into<String>) -> Self {
        Self::new(SysdfErrorCode::ChecksumMismatch, message)
    }

    /// Create an I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(SysdfErrorCode::IoError, message)
        }
    }

    /// Create an I/O error with path context
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at path: {}", path.display()), source)
    }

    /// Add details to an error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SysdfErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for SysdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SysdfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for sysdf operations
pub type SysdfResult<T> = Result<T, SysdfError>;
