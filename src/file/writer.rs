//! System file writer
//!
//! Pipeline:
//! 1. Encode the body for the selected [`BodyKind`](crate::codec::BodyKind)
//! 2. Prepend header and flags byte
//! 3. If CHECKSUM is set, append SHA-256 over `[flags][body]`
//!
//! The whole file is staged in memory before anything touches the sink.
//! [`FileWriter::write_to_path`] commits through a temporary file and an
//! atomic rename, so readers never observe a partially written file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::header::{FileHeader, Flags, HEADER_LEN};
use crate::checksum::{self, DIGEST_LEN};
use crate::codec;
use crate::errors::{SysdfError, SysdfResult};
use crate::observability::Logger;
use crate::system::System;

/// Writer for a single system.
///
/// The system is borrowed for the writer's lifetime, so it cannot be
/// mutated while a file is being produced from it.
#[derive(Debug, Clone)]
pub struct FileWriter<'a> {
    system: &'a System,
    flags: Flags,
}

impl<'a> FileWriter<'a> {
    /// Create a writer with no flags (compact body, no checksum)
    pub fn new(system: &'a System) -> Self {
        Self {
            system,
            flags: Flags::NONE,
        }
    }

    /// Builder-style variant of [`FileWriter::set_flags`]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.set_flags(flags);
        self
    }

    /// Replace the pending flags. Unknown bits are dropped.
    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags.known();
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn system(&self) -> &'a System {
        self.system
    }

    /// Runs the full pipeline and returns the encoded file.
    ///
    /// Deterministic: the same system and flags always give the same bytes.
    ///
    /// # Errors
    ///
    /// Returns `SYSDF_MALFORMED_BODY` if the system cannot be encoded.
    pub fn to_bytes(&self) -> SysdfResult<Vec<u8>> {
        let header = FileHeader::new(self.flags);
        let body = codec::encode(self.system, self.flags.body_kind())?;

        let trailer_len = if self.flags.has_checksum() { DIGEST_LEN } else { 0 };
        let mut buf = Vec::with_capacity(HEADER_LEN + body.len() + trailer_len);
        buf.extend_from_slice(&header.to_bytes());
        buf.extend_from_slice(&body);

        if self.flags.has_checksum() {
            let digest = checksum::digest(self.flags.bits(), &body);
            buf.extend_from_slice(&digest);
        }

        Logger::trace(
            "SYSDF_FILE_ENCODED",
            &[
                ("body_kind", self.flags.body_kind().as_str()),
                ("bytes", buf.len().to_string().as_str()),
                ("flags", self.flags.to_string().as_str()),
                ("members", self.system.member_count().to_string().as_str()),
            ],
        );

        Ok(buf)
    }

    /// Writes the encoded file to `sink` with a single `write_all`.
    ///
    /// # Errors
    ///
    /// Returns `SYSDF_IO_ERROR` if the sink fails.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> SysdfResult<()> {
        let bytes = self.to_bytes()?;
        sink.write_all(&bytes)
            .map_err(|e| SysdfError::io_error("Failed to write system file", e))?;
        sink.flush()
            .map_err(|e| SysdfError::io_error("Failed to flush system file", e))?;
        Ok(())
    }

    /// Atomically writes the encoded file to `path`.
    ///
    /// 1. Stage the full file in memory
    /// 2. Write and fsync a temporary file next to `path`
    /// 3. Rename the temporary file over `path`
    /// 4. fsync the parent directory
    ///
    /// On failure the destination is left untouched and the temporary file
    /// is removed.
    ///
    /// # Errors
    ///
    /// Returns `SYSDF_IO_ERROR` on any filesystem failure.
    pub fn write_to_path(&self, path: &Path) -> SysdfResult<()> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)?;

        Logger::info(
            "SYSDF_FILE_WRITTEN",
            &[
                ("bytes", bytes.len().to_string().as_str()),
                ("flags", self.flags.to_string().as_str()),
                ("path", path.display().to_string().as_str()),
            ],
        );

        Ok(())
    }
}

/// Replaces `path` with `bytes` through a fsynced sibling temporary file
/// and a rename.
///
/// Either the old contents or the complete new contents are visible at
/// `path`; on failure the temporary file is removed.
///
/// # Errors
///
/// Returns `SYSDF_IO_ERROR` on any filesystem failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> SysdfResult<()> {
    let temp_path = temp_path_for(path);

    if let Err(e) = write_and_rename(bytes, &temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Some(parent) = non_empty_parent(path) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

fn write_and_rename(bytes: &[u8], temp_path: &Path, path: &Path) -> SysdfResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .map_err(|e| SysdfError::io_error_at_path(temp_path, e))?;

    file.write_all(bytes)
        .map_err(|e| SysdfError::io_error_at_path(temp_path, e))?;

    file.sync_all().map_err(|e| {
        SysdfError::io_error_at_path(temp_path, e).with_details("fsync failed")
    })?;
    drop(file);

    fs::rename(temp_path, path).map_err(|e| {
        SysdfError::io_error_at_path(path, e).with_details("failed to commit temporary file")
    })
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Sibling temporary path: `<dir>/.<file_name>.<uuid>.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "system".to_string());
    let temp_name = format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple());

    match non_empty_parent(path) {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}
