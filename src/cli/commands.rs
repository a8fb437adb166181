//! CLI command implementations
//!
//! Commands that modify a file read it, verify its checksum if it has one,
//! apply the change and write it back atomically with the same flags.

use std::fs;
use std::path::Path;

use crate::checksum::{self, Verification};
use crate::codec::{self, BodyKind};
use crate::config::Config;
use crate::errors::SysdfError;
use crate::file::{write_atomic, FileReader, FileWriter, Flags};
use crate::observability::{Logger, Severity};
use crate::system::{Member, System};
use crate::uf2;

use super::args::{Cli, Command, FlagArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_fields, write_line};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_cli(cli)
}

/// Load configuration, set up logging and run the command
pub fn run_cli(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let severity = if cli.verbose {
        Severity::Trace
    } else {
        config.severity()?
    };
    Logger::set_min_severity(severity);

    run_command(cli.command, &config).map_err(|e| {
        if e.is_corruption() {
            Logger::error(
                "SYSDF_CORRUPT_INPUT",
                &[("code", e.code_str()), ("message", e.message())],
            );
        }
        e
    })
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, config: &Config) -> CliResult<()> {
    match cmd {
        Command::New { file, name, flags } => new(&file, &name, flags, config),
        Command::Add {
            file,
            name,
            pronouns,
        } => add(&file, Member::new(name, pronouns), config),
        Command::Sort { file } => sort(&file, config),
        Command::Info { file } => info(&file, config),
        Command::List { file } => list(&file, config),
        Command::Verify { file } => verify(&file, config),
        Command::Json { file } => json(&file, config),
        Command::Import { input, file, flags } => import(&input, &file, flags, config),
        Command::Uf2 { file, out, address } => export_uf2(&file, &out, address, config),
    }
}

/// Flags for a new file: configuration defaults with command line overrides
pub fn resolve_flags(args: FlagArgs, config: &Config) -> Flags {
    let mut flags = config.default_flags();
    if args.checksum {
        flags.insert(Flags::CHECKSUM);
    }
    if args.no_checksum {
        flags.remove(Flags::CHECKSUM);
    }
    if args.json {
        flags.insert(Flags::JSON_BLOB);
    }
    if args.compact {
        flags.remove(Flags::JSON_BLOB);
    }
    flags
}

fn open(path: &Path, config: &Config) -> CliResult<FileReader> {
    Ok(FileReader::open_path(path)?.with_limits(config.limits))
}

/// Opens a file for reading only; input without a header is read as a
/// bare compact body
fn open_lenient(path: &Path, config: &Config) -> CliResult<FileReader> {
    let data = fs::read(path).map_err(|e| SysdfError::io_error_at_path(path, e))?;
    Ok(FileReader::open_or_bare(data)?.with_limits(config.limits))
}

/// Opens a file for modification; a present checksum must match
fn open_for_update(path: &Path, config: &Config) -> CliResult<(System, Flags)> {
    let reader = open(path, config)?;
    if reader.has_checksum() {
        reader.verify_strict()?;
    }
    Ok((reader.to_system()?, reader.flags().known()))
}

/// Create a new, empty system file
pub fn new(path: &Path, name: &str, flags: FlagArgs, config: &Config) -> CliResult<()> {
    let system = System::new(name);
    FileWriter::new(&system)
        .with_flags(resolve_flags(flags, config))
        .write_to_path(path)?;
    Ok(())
}

/// Append a member and rewrite the file
pub fn add(path: &Path, member: Member, config: &Config) -> CliResult<()> {
    let (mut system, flags) = open_for_update(path, config)?;
    system.append_member(member);
    FileWriter::new(&system).with_flags(flags).write_to_path(path)?;
    Ok(())
}

/// Sort members by name and rewrite the file
pub fn sort(path: &Path, config: &Config) -> CliResult<()> {
    let (mut system, flags) = open_for_update(path, config)?;
    system.sort();
    FileWriter::new(&system).with_flags(flags).write_to_path(path)?;
    Ok(())
}

/// Summary lines for `info`
pub fn describe(reader: &FileReader) -> CliResult<Vec<(&'static str, String)>> {
    let system = reader.to_system()?;
    let checksum = match reader.verification() {
        Verification::NotApplicable if reader.has_checksum() => "missing trailer",
        other => other.as_str(),
    };

    let mut fields = vec![
        ("name", system.name().to_string()),
        ("body", reader.body_kind().to_string()),
        ("flags", reader.flags().to_string()),
        ("members", system.member_count().to_string()),
        ("checksum", checksum.to_string()),
    ];
    if let Some(trailer) = reader.trailer() {
        fields.push(("digest", checksum::format_digest(trailer)));
    }
    Ok(fields)
}

/// Show name, flags, member count and checksum state
pub fn info(path: &Path, config: &Config) -> CliResult<()> {
    let reader = open_lenient(path, config)?;
    write_fields(&describe(&reader)?)
}

/// List members in stored order
pub fn list(path: &Path, config: &Config) -> CliResult<()> {
    let system = open_lenient(path, config)?.to_system()?;
    for (index, member) in system.members().iter().enumerate() {
        if member.pronouns().is_empty() {
            write_line(&format!("{}\t{}", index, member.name()))?;
        } else {
            write_line(&format!("{}\t{}\t{}", index, member.name(), member.pronouns()))?;
        }
    }
    Ok(())
}

/// Strictly verify the checksum
pub fn verify(path: &Path, config: &Config) -> CliResult<()> {
    open(path, config)?.verify_strict()?;
    write_line("checksum ok")
}

/// Print the system as JSON
pub fn json(path: &Path, config: &Config) -> CliResult<()> {
    let json = open_lenient(path, config)?.to_json()?;
    write_line(&json)
}

/// Build a system file from a JSON document
pub fn import(input: &Path, path: &Path, flags: FlagArgs, config: &Config) -> CliResult<()> {
    let content = fs::read(input)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", input.display(), e)))?;
    let system = codec::decode(&content, BodyKind::Json, &config.limits)?;

    FileWriter::new(&system)
        .with_flags(resolve_flags(flags, config))
        .write_to_path(path)?;
    Ok(())
}

/// Export the compact body as a UF2 image
pub fn export_uf2(path: &Path, out: &Path, address: Option<u32>, config: &Config) -> CliResult<()> {
    let reader = open(path, config)?;
    if reader.has_checksum() {
        reader.verify_strict()?;
    }

    let image = reader
        .to_system()?
        .to_uf2(address.unwrap_or(uf2::DEFAULT_BASE_ADDRESS))?;
    write_atomic(out, &image)?;

    Logger::info(
        "SYSDF_UF2_WRITTEN",
        &[
            ("blocks", (image.len() / uf2::BLOCK_LEN).to_string().as_str()),
            ("path", out.display().to_string().as_str()),
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use crate::errors::SysdfErrorCode;
    use clap::Parser;
    use tempfile::TempDir;

    fn no_overrides() -> FlagArgs {
        FlagArgs::default()
    }

    #[test]
    fn test_resolve_flags_overrides_config() {
        let config = Config::default();
        assert_eq!(resolve_flags(no_overrides(), &config), Flags::CHECKSUM);

        let args = FlagArgs {
            no_checksum: true,
            json: true,
            ..FlagArgs::default()
        };
        assert_eq!(resolve_flags(args, &config), Flags::JSON_BLOB);

        let config = Config {
            json_blob: true,
            checksum: false,
            ..Config::default()
        };
        let args = FlagArgs {
            checksum: true,
            compact: true,
            ..FlagArgs::default()
        };
        assert_eq!(resolve_flags(args, &config), Flags::CHECKSUM);
    }

    #[test]
    fn test_new_add_sort_preserves_flags() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system.sysdf");
        let config = Config::default();
        let args = FlagArgs {
            json: true,
            ..FlagArgs::default()
        };

        new(&path, "Example", args, &config).unwrap();
        add(&path, Member::new("Zed", "he/him"), &config).unwrap();
        add(&path, Member::new("Ada", "she/her"), &config).unwrap();
        sort(&path, &config).unwrap();

        let reader = FileReader::open_path(&path).unwrap();
        assert_eq!(reader.flags(), Flags::CHECKSUM | Flags::JSON_BLOB);
        assert!(reader.verify());
        let system = reader.to_system().unwrap();
        assert_eq!(system.member(0).unwrap().name(), "Ada");
        assert_eq!(system.member(1).unwrap().name(), "Zed");
    }

    #[test]
    fn test_update_refuses_corrupted_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system.sysdf");
        let config = Config::default();
        new(&path, "Example", no_overrides(), &config).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[9] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let err = add(&path, Member::named("New"), &config).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::Format(SysdfErrorCode::ChecksumMismatch));
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_describe() {
        let system = System::with_members("Example", vec![Member::named("A")]);
        let bytes = FileWriter::new(&system).to_bytes().unwrap();
        let reader = FileReader::open(bytes).unwrap();

        let fields = describe(&reader).unwrap();
        assert_eq!(fields[0], ("name", "Example".to_string()));
        assert_eq!(fields[1], ("body", "compact".to_string()));
        assert_eq!(fields[2], ("flags", "NONE".to_string()));
        assert_eq!(fields[3], ("members", "1".to_string()));
        assert_eq!(fields[4], ("checksum", "absent".to_string()));
        assert_eq!(fields.len(), 5);

        let bytes = FileWriter::new(&system)
            .with_flags(Flags::CHECKSUM)
            .to_bytes()
            .unwrap();
        let digest = checksum::format_digest(&bytes[bytes.len() - 32..]);
        let fields = describe(&FileReader::open(bytes).unwrap()).unwrap();
        assert_eq!(fields[4], ("checksum", "valid".to_string()));
        assert_eq!(fields[5], ("digest", digest));
    }

    #[test]
    fn test_read_commands_accept_bare_body() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system.bin");
        let system = System::with_members("Bare", vec![Member::named("A")]);
        fs::write(&path, codec::encode(&system, BodyKind::Compact).unwrap()).unwrap();

        let config = Config::default();
        let reader = open_lenient(&path, &config).unwrap();
        assert_eq!(reader.to_system().unwrap(), system);
        info(&path, &config).unwrap();

        let err = add(&path, Member::named("B"), &config).unwrap_err();
        assert_eq!(err.code_str(), "SYSDF_BAD_MAGIC");
    }

    #[test]
    fn test_import_and_export_uf2() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("system.json");
        let path = temp_dir.path().join("system.sysdf");
        let out = temp_dir.path().join("system.uf2");
        fs::write(
            &input,
            r#"{"name":"Imported","members":[{"name":"Myriad Kit","pronouns":"they/them"}]}"#,
        )
        .unwrap();

        let config = Config::default();
        import(&input, &path, no_overrides(), &config).unwrap();
        let system = FileReader::open_path(&path).unwrap().to_system().unwrap();
        assert_eq!(system.name(), "Imported");

        export_uf2(&path, &out, None, &config).unwrap();
        let image = fs::read(&out).unwrap();
        assert_eq!(image, system.to_uf2(uf2::DEFAULT_BASE_ADDRESS).unwrap());
    }

    #[test]
    fn test_uf2_export_is_atomic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system.sysdf");
        let out = temp_dir.path().join("system.uf2");
        let config = Config::default();
        new(&path, "Example", no_overrides(), &config).unwrap();

        // Replacing a non-empty directory fails at the rename step
        fs::create_dir(&out).unwrap();
        fs::write(out.join("keep"), b"kept").unwrap();
        let err = export_uf2(&path, &out, None, &config).unwrap_err();
        assert_eq!(err.code_str(), "SYSDF_IO_ERROR");
        assert_eq!(fs::read(out.join("keep")).unwrap(), b"kept");

        // Only the source and the untouched destination remain
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_run_cli_reports_corrupt_input() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("system.sysdf");
        fs::write(&path, b"not a system file").unwrap();

        let cli = Cli::try_parse_from(["sysdf", "verify", path.to_str().unwrap()]).unwrap();
        let err = run_cli(cli).unwrap_err();
        assert_eq!(err.code_str(), "SYSDF_BAD_MAGIC");
        assert!(err.is_corruption());
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("bad.json");
        let path = temp_dir.path().join("system.sysdf");
        fs::write(&input, r#"{"members":[]}"#).unwrap();

        let err = import(&input, &path, no_overrides(), &Config::default()).unwrap_err();
        assert_eq!(err.code_str(), "SYSDF_MALFORMED_BODY");
        assert!(!path.exists());
    }
}
