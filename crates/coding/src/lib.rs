//! # Coding — binary integer and slice framing primitives
//!
//! Every on-disk and in-memory structure in the StratumKV storage core is
//! built from four encodings:
//!
//! - **Varint32/64**: little-endian base-128, 7 data bits per byte, the
//!   continuation bit (`0x80`) set on every byte except the last.
//! - **Fixed32/64**: raw little-endian bytes.
//! - **Length-prefixed slice**: `varint32(len) | bytes`.
//!
//! Decoding never panics on malformed input — a truncated varint or a
//! length prefix that overruns the buffer returns `None`, and callers
//! surface that as a corruption error at their own layer.

use byteorder::{ByteOrder, LittleEndian};

/// Appends a varint32 encoding of `v` to `dst`.
pub fn encode_varint32(dst: &mut Vec<u8>, mut v: u32) {
    while v >= 0x80 {
        dst.push((v as u8) | 0x80);
        v >>= 7;
    }
    dst.push(v as u8);
}

/// Appends a varint64 encoding of `v` to `dst`.
pub fn encode_varint64(dst: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        dst.push((v as u8) | 0x80);
        v >>= 7;
    }
    dst.push(v as u8);
}

/// Returns the exact number of bytes `encode_varint64` would emit for `v`.
#[must_use]
pub fn varint_length(mut v: u64) -> usize {
    let mut len = 1;
    while v >= 0x80 {
        v >>= 7;
        len += 1;
    }
    len
}

/// Appends `v` as 4 little-endian bytes.
pub fn put_fixed32(dst: &mut Vec<u8>, v: u32) {
    dst.extend_from_slice(&v.to_le_bytes());
}

/// Appends `v` as 8 little-endian bytes.
pub fn put_fixed64(dst: &mut Vec<u8>, v: u64) {
    dst.extend_from_slice(&v.to_le_bytes());
}

/// Decodes 4 little-endian bytes starting at `buf[0]`.
///
/// # Panics
///
/// Panics if `buf` is shorter than 4 bytes. Callers bounds-check first.
#[must_use]
pub fn decode_fixed32(buf: &[u8]) -> u32 {
    LittleEndian::read_u32(buf)
}

/// Decodes 8 little-endian bytes starting at `buf[0]`.
///
/// # Panics
///
/// Panics if `buf` is shorter than 8 bytes. Callers bounds-check first.
#[must_use]
pub fn decode_fixed64(buf: &[u8]) -> u64 {
    LittleEndian::read_u64(buf)
}

/// Decodes a varint32 from the front of `input`, advancing it past the
/// consumed bytes.
///
/// Returns `None` if the buffer is truncated mid-varint or the value
/// overflows 32 bits. On `None` the state of `input` is unspecified and
/// the caller must treat the data as corrupt.
pub fn get_varint32(input: &mut &[u8]) -> Option<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;
    while shift <= 28 {
        let (&byte, rest) = input.split_first()?;
        *input = rest;
        if byte & 0x80 == 0 {
            return Some(result | (u32::from(byte) << shift));
        }
        result |= u32::from(byte & 0x7f) << shift;
        shift += 7;
    }
    None
}

/// Decodes a varint64 from the front of `input`, advancing it past the
/// consumed bytes. Returns `None` on truncation or 64-bit overflow.
pub fn get_varint64(input: &mut &[u8]) -> Option<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;
    while shift <= 63 {
        let (&byte, rest) = input.split_first()?;
        *input = rest;
        if byte & 0x80 == 0 {
            return Some(result | (u64::from(byte) << shift));
        }
        result |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    None
}

/// Appends `varint32(value.len()) | value` to `dst`.
pub fn put_length_prefixed_slice(dst: &mut Vec<u8>, value: &[u8]) {
    encode_varint32(dst, value.len() as u32);
    dst.extend_from_slice(value);
}

/// Decodes a length-prefixed slice from the front of `input`, advancing
/// past it. Returns `None` if the prefix is malformed or the declared
/// length exceeds the remaining bytes.
pub fn get_length_prefixed_slice<'a>(input: &mut &'a [u8]) -> Option<&'a [u8]> {
    let len = get_varint32(input)? as usize;
    if len > input.len() {
        return None;
    }
    let (value, rest) = input.split_at(len);
    *input = rest;
    Some(value)
}

#[cfg(test)]
mod tests;
