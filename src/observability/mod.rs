//! Observability for sysdf
//!
//! Structured JSON logging only. Events emitted by the library:
//!
//! - `SYSDF_FILE_ENCODED` (TRACE): body encoded, before persistence
//! - `SYSDF_FILE_WRITTEN` (INFO): file committed to disk
//! - `SYSDF_FILE_OPENED` (TRACE): header parsed
//! - `SYSDF_CHECKSUM_MISMATCH` (WARN): trailer does not match the body
//! - `SYSDF_BARE_BODY` (INFO): headerless input accepted as a compact body
//! - `SYSDF_UF2_WRITTEN` (INFO): UF2 image written by the CLI
//! - `SYSDF_CORRUPT_INPUT` (ERROR): CLI command failed on a damaged or foreign file

mod logger;

pub use logger::{Logger, Severity};
