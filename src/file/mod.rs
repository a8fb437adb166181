//! System file format
//!
//! ```text
//! [magic "SYBD"][version u32 LE][flags u8][body][optional 32-byte SHA-256]
//! ```
//!
//! The flags byte selects the body encoding (compact or JSON) and whether a
//! checksum trailer follows. The two choices are independent; writing runs
//! "encode body" and then, optionally, "append checksum".

mod header;
mod reader;
mod writer;

pub use header::{FileHeader, Flags, HEADER_LEN, MAGIC, VERSION};
pub use reader::FileReader;
pub use writer::{write_atomic, FileWriter};
