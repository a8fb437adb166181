//! Configuration file for the sysdf tool
//!
//! JSON document, every field optional:
//!
//! ```json
//! {
//!   "limits": { "max_members": 65536, "max_string_len": 1048576 },
//!   "checksum": true,
//!   "json_blob": false,
//!   "log_level": "warn"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::Limits;
use crate::file::Flags;
use crate::observability::Severity;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Decode limits
    #[serde(default)]
    pub limits: Limits,

    /// Write a checksum trailer on new files (default: true)
    #[serde(default = "default_checksum")]
    pub checksum: bool,

    /// Write JSON bodies on new files (default: false)
    #[serde(default)]
    pub json_blob: bool,

    /// Minimum log severity: trace, info, warn or error (default: "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_checksum() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            checksum: default_checksum(),
            json_blob: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.limits.max_members == 0 {
            return Err(ConfigError::Invalid("limits.max_members must be > 0".into()));
        }

        if self.limits.max_string_len == 0 {
            return Err(ConfigError::Invalid("limits.max_string_len must be > 0".into()));
        }

        self.severity()?;
        Ok(())
    }

    /// Parsed log level
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Flags for newly written files
    pub fn default_flags(&self) -> Flags {
        let mut flags = Flags::NONE;
        flags.set(Flags::CHECKSUM, self.checksum);
        flags.set(Flags::JSON_BLOB, self.json_blob);
        flags
    }
}
