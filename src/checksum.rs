//! SHA-256 trailer for system files
//!
//! The digest covers the flags byte followed by the body. It detects
//! corruption only; there is no key and no authentication.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length in bytes of the checksum trailer
pub const DIGEST_LEN: usize = 32;

/// Checksum trailer bytes
pub type DigestBytes = [u8; DIGEST_LEN];

/// Outcome of verifying a checksum trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Trailer present and matches the recomputed digest
    Valid,
    /// Trailer present but does not match
    Mismatch,
    /// No trailer to check against
    NotApplicable,
}

impl Verification {
    pub fn is_valid(self) -> bool {
        self == Verification::Valid
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verification::Valid => "valid",
            Verification::Mismatch => "mismatch",
            Verification::NotApplicable => "absent",
        }
    }
}

/// Computes the digest over `[flags][body]`.
///
/// This function is deterministic: the same input always produces the same output.
pub fn digest(flags: u8, body: &[u8]) -> DigestBytes {
    let mut hasher = Sha256::new();
    hasher.update([flags]);
    hasher.update(body);
    hasher.finalize().into()
}

/// Verifies a trailer against the recomputed digest.
///
/// Returns [`Verification::NotApplicable`] when the trailer is missing or
/// not exactly [`DIGEST_LEN`] bytes long.
pub fn verify(flags: u8, body: &[u8], trailer: Option<&[u8]>) -> Verification {
    let trailer = match trailer {
        Some(trailer) if trailer.len() == DIGEST_LEN => trailer,
        _ => return Verification::NotApplicable,
    };

    let expected = digest(flags, body);
    if bool::from(expected[..].ct_eq(trailer)) {
        Verification::Valid
    } else {
        Verification::Mismatch
    }
}

/// Formats a digest as lowercase hex
pub fn format_digest(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let body = b"system body for checksum";
        assert_eq!(digest(0x01, body), digest(0x01, body));
    }

    #[test]
    fn test_digest_covers_flags_byte() {
        let body = b"same body";
        assert_ne!(digest(0x01, body), digest(0x03, body));
    }

    #[test]
    fn test_known_vector() {
        // SHA-256 of the single byte 0x00
        assert_eq!(
            format_digest(&digest(0x00, b"")),
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
    }

    #[test]
    fn test_verify_outcomes() {
        let body = b"payload";
        let trailer = digest(0x01, body);

        assert_eq!(verify(0x01, body, Some(&trailer)), Verification::Valid);
        assert_eq!(verify(0x01, b"Payload", Some(&trailer)), Verification::Mismatch);
        assert_eq!(verify(0x03, body, Some(&trailer)), Verification::Mismatch);
        assert_eq!(verify(0x01, body, None), Verification::NotApplicable);
        assert_eq!(
            verify(0x01, body, Some(&trailer[..31])),
            Verification::NotApplicable
        );
    }

    #[test]
    fn test_verification_is_valid() {
        assert!(Verification::Valid.is_valid());
        assert!(!Verification::Mismatch.is_valid());
        assert!(!Verification::NotApplicable.is_valid());
    }
}
