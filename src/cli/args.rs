//! CLI argument definitions using clap
//!
//! Commands:
//! - sysdf new <file> --name <name>
//! - sysdf add <file> --name <name> [--pronouns <pronouns>]
//! - sysdf sort <file>
//! - sysdf info <file>
//! - sysdf list <file>
//! - sysdf verify <file>
//! - sysdf json <file>
//! - sysdf import <json> <file>
//! - sysdf uf2 <file> <out>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// sysdf - create, inspect and verify system definition files
#[derive(Parser, Debug)]
#[command(name = "sysdf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at TRACE level regardless of configuration
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Flag overrides for commands that write a file
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct FlagArgs {
    /// Append a SHA-256 checksum trailer
    #[arg(long, conflicts_with = "no_checksum")]
    pub checksum: bool,

    /// Do not append a checksum trailer
    #[arg(long)]
    pub no_checksum: bool,

    /// Store the body as JSON
    #[arg(long, conflicts_with = "compact")]
    pub json: bool,

    /// Store the body as compact binary
    #[arg(long)]
    pub compact: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new, empty system file
    New {
        /// System file to create
        file: PathBuf,

        /// System name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Append a member to a system file
    Add {
        /// System file to modify
        file: PathBuf,

        /// Member name
        #[arg(long)]
        name: String,

        /// Member pronouns
        #[arg(long, default_value = "")]
        pronouns: String,
    },

    /// Sort members by name
    Sort {
        /// System file to modify
        file: PathBuf,
    },

    /// Show name, flags, member count and checksum state
    Info {
        /// System file to inspect
        file: PathBuf,
    },

    /// List members in stored order
    List {
        /// System file to inspect
        file: PathBuf,
    },

    /// Verify the checksum trailer; fails if absent or wrong
    Verify {
        /// System file to verify
        file: PathBuf,
    },

    /// Print the system as JSON
    Json {
        /// System file to convert
        file: PathBuf,
    },

    /// Build a system file from a JSON document
    Import {
        /// JSON document with "name" and "members"
        input: PathBuf,

        /// System file to write
        file: PathBuf,

        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Export the compact body as a UF2 image for the badge
    Uf2 {
        /// System file to export
        file: PathBuf,

        /// UF2 image to write
        out: PathBuf,

        /// Flash address of the first block
        #[arg(long, value_parser = parse_address)]
        address: Option<u32>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal address
pub fn parse_address(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => value.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", value, e))
}
