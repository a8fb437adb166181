//! Output helpers for CLI commands
//!
//! Command output goes to stdout; logs and errors go to stderr.

use std::io::{self, Write};

use super::errors::CliResult;

/// Write `key: value` lines to stdout
pub fn write_fields(fields: &[(&str, String)]) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    write_fields_to(&mut stdout, fields)?;
    stdout.flush()?;
    Ok(())
}

fn write_fields_to<W: Write>(writer: &mut W, fields: &[(&str, String)]) -> io::Result<()> {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in fields {
        writeln!(writer, "{:width$}  {}", format!("{}:", key), value, width = width + 1)?;
    }
    Ok(())
}

/// Write a line to stdout
pub fn write_line(line: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}
