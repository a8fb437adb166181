//! CLI module for sysdf
//!
//! Provides command-line interface for:
//! - new / add / sort: create and edit system files
//! - info / list / verify / json: inspect system files
//! - import: build a system file from JSON
//! - uf2: export a flashable image

mod args;
mod commands;
mod errors;
mod io;

pub use args::{parse_address, Cli, Command, FlagArgs};
pub use commands::{
    add, describe, export_uf2, import, info, json, list, new, resolve_flags, run, run_cli,
    run_command, sort, verify,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_fields, write_line};
