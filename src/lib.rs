//! sysdf - system definition files
//!
//! A system definition file stores a named, ordered list of members behind
//! a fixed header, with an optional SHA-256 trailer:
//!
//! ```text
//! "SYBD" | version u32 LE | flags u8 | body | [sha256(flags || body)]
//! ```
//!
//! The body is either the compact length-prefixed encoding or JSON,
//! selected by the `JSON_BLOB` flag.

pub mod checksum;
pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod file;
pub mod observability;
pub mod system;
pub mod uf2;

pub use checksum::Verification;
pub use codec::{BodyKind, Limits};
pub use config::{Config, ConfigError};
pub use errors::{SysdfError, SysdfErrorCode, SysdfResult};
pub use file::{FileHeader, FileReader, FileWriter, Flags};
pub use system::{Member, System};
