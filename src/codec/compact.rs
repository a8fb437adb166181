//! Compact binary body
//!
//! Format:
//! - name_len (unsigned LEB128 varint; one byte below 128)
//! - name (UTF-8 bytes)
//! - member_count (u32 LE)
//! - member_count ×:
//!   - name_len (u32 LE)
//!   - name (UTF-8 bytes)
//!   - pronouns_len (u32 LE)
//!   - pronouns (UTF-8 bytes)
//!
//! No padding, no trailing bytes.

use super::Limits;
use crate::errors::{SysdfError, SysdfResult};
use crate::system::{Member, System};

/// Smallest possible encoded member: two empty length-prefixed strings
const MIN_MEMBER_LEN: usize = 4 + 4;

/// A u32 needs at most five 7-bit groups
const MAX_VARINT_LEN: usize = 5;

pub(super) fn encode(system: &System) -> SysdfResult<Vec<u8>> {
    let name_len = length_u32(system.name(), "system name")?;
    let capacity = varint_len(name_len)
        + system.name().len()
        + 4
        + system
            .members()
            .iter()
            .map(|m| MIN_MEMBER_LEN + m.name().len() + m.pronouns().len())
            .sum::<usize>();
    let mut buf = Vec::with_capacity(capacity);

    write_varint(&mut buf, name_len);
    buf.extend_from_slice(system.name().as_bytes());

    let count = u32::try_from(system.member_count()).map_err(|_| {
        SysdfError::malformed_body("Member count does not fit in u32")
            .with_details(format!("count {}", system.member_count()))
    })?;
    buf.extend_from_slice(&count.to_le_bytes());

    for member in system.members() {
        write_string(&mut buf, member.name(), "member name")?;
        write_string(&mut buf, member.pronouns(), "member pronouns")?;
    }

    Ok(buf)
}

fn length_u32(value: &str, field: &str) -> SysdfResult<u32> {
    u32::try_from(value.len()).map_err(|_| {
        SysdfError::malformed_body(format!("{} does not fit in a u32 length prefix", field))
            .with_details(format!("length {}", value.len()))
    })
}

fn write_string(buf: &mut Vec<u8>, value: &str, field: &str) -> SysdfResult<()> {
    let len = length_u32(value, field)?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn varint_len(mut value: u32) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

fn write_varint(buf: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

pub(super) fn decode(body: &[u8], limits: &Limits) -> SysdfResult<System> {
    let mut reader = BodyReader::new(body, limits);

    let name = reader.read_name()?;
    let count = reader.read_u32("member count")?;

    if count > limits.max_members {
        return Err(SysdfError::malformed_body("Member count exceeds limit")
            .with_details(format!("count {}, limit {}", count, limits.max_members)));
    }

    // Every member needs at least two length prefixes
    let count = count as usize;
    if count > reader.remaining() / MIN_MEMBER_LEN {
        return Err(SysdfError::malformed_body("Member count exceeds remaining body")
            .with_details(format!("count {}, remaining {} bytes", count, reader.remaining())));
    }

    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        let member_name = reader.read_string("member name")?;
        let pronouns = reader.read_string("member pronouns")?;
        members.push(Member::new(member_name, pronouns));
    }

    if reader.remaining() != 0 {
        return Err(SysdfError::malformed_body("Trailing bytes after last member")
            .with_details(format!("{} bytes", reader.remaining())));
    }

    Ok(System::with_members(name, members))
}

pub(super) fn decode_name(body: &[u8], limits: &Limits) -> SysdfResult<String> {
    BodyReader::new(body, limits).read_name()
}

/// Bounds-checked reader over a compact body
struct BodyReader<'a> {
    data: &'a [u8],
    offset: usize,
    limits: &'a Limits,
}

impl<'a> BodyReader<'a> {
    fn new(data: &'a [u8], limits: &'a Limits) -> Self {
        Self {
            data,
            offset: 0,
            limits,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize, field: &str) -> SysdfResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(SysdfError::malformed_body(format!("Body truncated in {}", field))
                .with_details(format!(
                    "need {} bytes at offset {}, {} remaining",
                    len,
                    self.offset,
                    self.remaining()
                )));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_u32(&mut self, field: &str) -> SysdfResult<u32> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads an unsigned LEB128 value. Unterminated, overlong and
    /// non-minimal encodings are rejected.
    fn read_varint(&mut self, field: &str) -> SysdfResult<u32> {
        let start = self.offset;
        let mut value: u32 = 0;

        for index in 0..MAX_VARINT_LEN {
            let byte = self.take(1, field)?[0];
            let group = u32::from(byte & 0x7F);

            if index == MAX_VARINT_LEN - 1 && group > 0x0F {
                return Err(SysdfError::malformed_body(format!("{} length overflows u32", field))
                    .with_details(format!("varint at offset {}", start)));
            }
            value |= group << (7 * index);

            if byte & 0x80 == 0 {
                if index > 0 && byte == 0 {
                    return Err(SysdfError::malformed_body(format!(
                        "Non-minimal {} length",
                        field
                    ))
                    .with_details(format!("varint at offset {}", start)));
                }
                return Ok(value);
            }
        }

        Err(SysdfError::malformed_body(format!("Unterminated {} length", field))
            .with_details(format!("varint at offset {}", start)))
    }

    fn read_name(&mut self) -> SysdfResult<String> {
        let len = self.read_varint("system name")?;
        self.read_bytes_as_string(len, "system name")
    }

    fn read_string(&mut self, field: &str) -> SysdfResult<String> {
        let len = self.read_u32(field)?;
        self.read_bytes_as_string(len, field)
    }

    fn read_bytes_as_string(&mut self, len: u32, field: &str) -> SysdfResult<String> {
        if len > self.limits.max_string_len {
            return Err(SysdfError::malformed_body(format!("{} exceeds length limit", field))
                .with_details(format!("length {}, limit {}", len, self.limits.max_string_len)));
        }

        let bytes = self.take(len as usize, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            SysdfError::malformed_body(format!("Invalid UTF-8 in {}", field))
                .with_details(e.to_string())
        })
    }
}
