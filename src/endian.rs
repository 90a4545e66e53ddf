//! Little-endian integer reads for legacy `.dat` files
//!
//! Every multi-byte integer in the format (trie pointers, the segment
//! boundary, coordinates, metro/area codes) is stored little-endian with a
//! width of 3 or 4 bytes. Widths are not powers of two, so the values are
//! assembled byte by byte instead of going through `u32::from_le_bytes`.
//!
//! # Usage Pattern
//!
//! ```rust
//! use geodat::endian::{read_uint_le, read_u24_le};
//!
//! let buffer = [0x00, 0xFF, 0xFF, 0x78, 0x56, 0x34, 0x12];
//!
//! // 3-byte pointer: 0xFFFF00 = 16776960
//! assert_eq!(read_u24_le(&buffer, 0), Some(16_776_960));
//!
//! // 4-byte pointer
//! assert_eq!(read_uint_le(&buffer, 3, 4), Some(0x12345678));
//!
//! // Out of bounds reads return None
//! assert_eq!(read_uint_le(&buffer, 5, 4), None);
//! ```

/// Decode `bytes` as a little-endian unsigned integer
///
/// Computes `sum(bytes[i] << (8 * i))`. At most 4 bytes are meaningful;
/// callers pass 3 or 4.
#[inline(always)]
pub fn le_value(bytes: &[u8]) -> u32 {
    debug_assert!(bytes.len() <= 4);
    bytes
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | ((b as u32) << (8 * i)))
}

/// Read a `width`-byte little-endian integer at `offset`
///
/// Returns `None` if `offset + width` runs past the end of `buffer`.
#[inline]
pub fn read_uint_le(buffer: &[u8], offset: usize, width: usize) -> Option<u32> {
    let end = offset.checked_add(width)?;
    buffer.get(offset..end).map(le_value)
}

/// Read a 3-byte little-endian integer at `offset`
#[inline]
pub fn read_u24_le(buffer: &[u8], offset: usize) -> Option<u32> {
    read_uint_le(buffer, offset, 3)
}
