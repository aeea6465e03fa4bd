//! Variable-length integer encoding.
//!
//! Seven payload bits per byte, high bit set on every byte but the last.
//! Per-category counts in dictionary records are written this way, so the
//! common case (small counts, few categories) costs one byte per value.

use std::io::Read;

use byteorder::ReadBytesExt;

use crate::error::{LexiclassError, Result};

/// Maximum number of bytes a varint-encoded u64 can occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// Append the varint encoding of `value` to `buf`, returning the number of bytes written.
pub fn encode_u64_into(value: u64, buf: &mut Vec<u8>) -> usize {
    let mut val = value;
    let mut written = 0;

    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;
        if val != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        written += 1;
        if val == 0 {
            return written;
        }
    }
}

/// Encode a u64 value using variable-length encoding.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MAX_VARINT_LEN);
    encode_u64_into(value, &mut bytes);
    bytes
}

/// Decode a u64 value from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_u64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        // The tenth byte may only carry the top bit of a u64.
        if shift >= 64 || (shift == 63 && (byte & 0x7F) > 1) {
            return Err(LexiclassError::index("VarInt overflow"));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, i + 1));
        }

        shift += 7;
    }

    Err(LexiclassError::index("Incomplete VarInt"))
}

/// Read a variable-length encoded u64 from a reader.
///
/// Returns the value together with the raw bytes, so callers can feed them
/// into a running checksum.
pub fn read_u64<R: Read>(reader: &mut R) -> Result<(u64, Vec<u8>)> {
    let mut bytes = Vec::with_capacity(2);
    loop {
        let byte = reader.read_u8()?;
        bytes.push(byte);
        if byte & 0x80 == 0 {
            break;
        }
        if bytes.len() >= MAX_VARINT_LEN {
            return Err(LexiclassError::index("VarInt overflow"));
        }
    }
    let (value, _) = decode_u64(&bytes)?;
    Ok((value, bytes))
}
