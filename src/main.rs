//! sysdf CLI entry point
//!
//! Parses arguments, runs the command and prints any error to stderr
//! as `CODE: message` with a non-zero exit status. All logic lives in
//! the CLI module.

use sysdf::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
