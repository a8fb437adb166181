//! UF2 export of the compact system body
//!
//! Badges load the compact body straight from flash. UF2 is the block format
//! the RP2040 boot ROM accepts over USB mass storage.
//!
//! Block layout (512 bytes, all words u32 LE):
//! - magic start 0, magic start 1
//! - flags (0x2000 when a family id is present)
//! - target address
//! - payload size (always 256)
//! - block number, total block count
//! - family id
//! - 256 payload bytes (last chunk zero padded)
//! - 220 zero bytes
//! - magic end

use crate::codec::{self, BodyKind};
use crate::errors::SysdfResult;
use crate::system::System;

pub const UF2_MAGIC_START0: u32 = 0x0A32_4655;
pub const UF2_MAGIC_START1: u32 = 0x9E5D_5157;
pub const UF2_MAGIC_END: u32 = 0x0AB1_6F30;

/// Family id of the RP2040
pub const RP2040_FAMILY_ID: u32 = 0xE48B_FF56;

/// Flag marking the family id field as valid
pub const FLAG_FAMILY_ID_PRESENT: u32 = 0x0000_2000;

pub const BLOCK_LEN: usize = 512;
pub const PAYLOAD_LEN: usize = 256;

const HEADER_WORDS: usize = 8;
const PADDING_LEN: usize = BLOCK_LEN - HEADER_WORDS * 4 - PAYLOAD_LEN - 4;

/// Start of XIP flash on the RP2040
pub const RP2040_FLASH_BASE: u32 = 0x1000_0000;

/// Offset of the system blob within flash
pub const SYSTEM_DATA_OFFSET: u32 = 0x0004_0000;

/// Default flash address of the system blob on the badge
pub const DEFAULT_BASE_ADDRESS: u32 = RP2040_FLASH_BASE + SYSTEM_DATA_OFFSET;

/// Wraps `payload` into UF2 blocks starting at `base_address`.
///
/// An empty payload yields no blocks.
pub fn encode(payload: &[u8], family_id: u32, base_address: u32) -> Vec<u8> {
    let block_count = payload.len().div_ceil(PAYLOAD_LEN);
    let flags = if family_id != 0 { FLAG_FAMILY_ID_PRESENT } else { 0 };

    let mut out = Vec::with_capacity(block_count * BLOCK_LEN);
    for (block_no, chunk) in payload.chunks(PAYLOAD_LEN).enumerate() {
        let offset = (block_no * PAYLOAD_LEN) as u32;
        let header = [
            UF2_MAGIC_START0,
            UF2_MAGIC_START1,
            flags,
            base_address.wrapping_add(offset),
            PAYLOAD_LEN as u32,
            block_no as u32,
            block_count as u32,
            family_id,
        ];
        for word in header {
            out.extend_from_slice(&word.to_le_bytes());
        }

        out.extend_from_slice(chunk);
        out.resize(out.len() + (PAYLOAD_LEN - chunk.len()) + PADDING_LEN, 0);
        out.extend_from_slice(&UF2_MAGIC_END.to_le_bytes());
    }

    out
}

impl System {
    /// Compact-encodes the system and wraps it for the RP2040.
    pub fn to_uf2(&self, base_address: u32) -> SysdfResult<Vec<u8>> {
        let body = codec::encode(self, BodyKind::Compact)?;
        Ok(encode(&body, RP2040_FAMILY_ID, base_address))
    }
}
