//! EBML variable-length integers and fixed-width big-endian decoding.
//!
//! The VINT reader is used by the Matroska element model; the big-endian
//! helpers back every fixed-width field in both container parsers.

use crate::region::{ByteSource, RegionReader};
use crate::{Error, Result};

/// Maximum VINT length in bytes.
pub const MAX_VINT_LENGTH: usize = 8;

/// Decoded variable-length integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vint {
    /// Encoded length in bytes (1..=8).
    pub length: usize,
    /// Decoded value, with or without the marker bit depending on how it was read.
    pub value: u64,
}

impl Vint {
    /// Whether a masked size VINT has every value bit set, which EBML
    /// reserves for "unknown size".
    pub fn is_unknown_size(&self) -> bool {
        self.value == (1u64 << (7 * self.length)) - 1
    }
}

/// Read one VINT at the cursor.
///
/// The number of leading zero bits in the first byte gives the count of
/// trailing bytes. With `raw` the marker bit is kept, which is how element
/// IDs are compared; without it the marker is masked off, which is how sizes
/// are decoded.
pub fn read_vint<S: ByteSource + ?Sized>(reader: &mut RegionReader<'_, S>, raw: bool) -> Result<Vint> {
    let offset = reader.position();
    let first = reader.read_u8()?;
    if first == 0 {
        return Err(Error::malformed(format!(
            "VINT with zero header byte at offset {offset}"
        )));
    }

    let tail = first.leading_zeros() as usize;
    let marker = 0x80u8 >> tail;
    let head = if raw { first } else { first & !marker };

    let mut value = head as u64;
    for byte in reader.read_exact(tail as u64)? {
        value = (value << 8) | byte as u64;
    }

    Ok(Vint {
        length: tail + 1,
        value,
    })
}

/// Encode `value` as a masked VINT of minimal width.
///
/// Values whose minimal encoding would collide with the unknown-size marker
/// are widened by one byte.
pub fn encode_vint(value: u64) -> Result<Vec<u8>> {
    let length = (1..=MAX_VINT_LENGTH)
        .find(|&len| value < (1u64 << (7 * len)) - 1)
        .ok_or_else(|| Error::unsupported(format!("{value} does not fit in an 8-byte VINT")))?;

    let marked = value | (1u64 << (7 * length));
    Ok(marked.to_be_bytes()[8 - length..].to_vec())
}

/// Decode an unsigned big-endian integer of 0 to 8 bytes.
pub fn uint_be(bytes: &[u8]) -> Result<u64> {
    if bytes.len() > 8 {
        return Err(Error::unsupported(format!(
            "{}-byte unsigned integer",
            bytes.len()
        )));
    }
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

/// Decode a signed big-endian integer of 1, 2, 4 or 8 bytes, sign-extended
/// from its width.
pub fn int_be(bytes: &[u8]) -> Result<i64> {
    match *bytes {
        [a] => Ok(a as i8 as i64),
        [a, b] => Ok(i16::from_be_bytes([a, b]) as i64),
        [a, b, c, d] => Ok(i32::from_be_bytes([a, b, c, d]) as i64),
        [a, b, c, d, e, f, g, h] => Ok(i64::from_be_bytes([a, b, c, d, e, f, g, h])),
        _ => Err(Error::unsupported(format!(
            "{}-byte signed integer",
            bytes.len()
        ))),
    }
}

/// Read an EBML element header, returning the raw ID and the masked size VINT.
pub fn read_element_header<S: ByteSource + ?Sized>(
    reader: &mut RegionReader<'_, S>,
) -> Result<(u32, Vint)> {
    let offset = reader.position();
    let id = read_vint(reader, true)?;
    if id.length > 4 {
        return Err(Error::malformed(format!(
            "element ID of {} bytes at offset {offset}",
            id.length
        )));
    }
    let size = read_vint(reader, false)?;
    Ok((id.value as u32, size))
}
