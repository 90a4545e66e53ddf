//! Legacy Search Tree Traversal
//!
//! The trie starts at byte 0. Node `n` occupies `2 * record_width` bytes at
//! `n * 2 * record_width` and holds two little-endian child pointers:
//! - left (address bit 0), right (address bit 1)
//! - a pointer below the segment boundary is the next node index
//! - a pointer at or above it ends the walk and locates the payload

use super::format::DatHeader;
use super::types::RecordWidth;
use crate::endian::read_uint_le;
use crate::error::DecodeError;
use std::net::Ipv4Addr;

/// Result of walking the trie for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieMatch {
    /// Pointer value that ended the walk (at or above the segment boundary)
    pub payload_offset: u32,
    /// Network prefix length (netmask)
    pub prefix_len: u8,
}

/// Search tree over a legacy database buffer
pub struct SearchTree<'a> {
    /// The raw file data containing the tree
    data: &'a [u8],
    record_width: RecordWidth,
    segment_boundary: u32,
}

impl<'a> SearchTree<'a> {
    /// Create a new search tree
    pub fn new(data: &'a [u8], record_width: RecordWidth, segment_boundary: u32) -> Self {
        Self {
            data,
            record_width,
            segment_boundary,
        }
    }

    /// Create a search tree from a scanned header
    ///
    /// Returns `None` when the header has no segment boundary.
    pub fn from_header(data: &'a [u8], header: &DatHeader) -> Option<Self> {
        header
            .segment_boundary
            .map(|boundary| Self::new(data, header.record_width, boundary))
    }

    /// First pointer value that is a payload locator
    pub fn segment_boundary(&self) -> u32 {
        self.segment_boundary
    }

    /// Look up an IPv4 address
    pub fn lookup_v4(&self, addr: Ipv4Addr) -> Result<TrieMatch, DecodeError> {
        self.lookup(u32::from(addr))
    }

    /// Walk the trie for a numeric address, most significant bit first
    ///
    /// Always finishes within 32 node reads. A walk that uses up every bit
    /// without reaching the payload region means the file is corrupt.
    pub fn lookup(&self, ipnum: u32) -> Result<TrieMatch, DecodeError> {
        let mut node = 0u32;

        for depth in (0..32u8).rev() {
            let side = ((ipnum >> depth) & 1) as u8;
            let record = self.read_record(node, side)?;

            if record >= self.segment_boundary {
                return Ok(TrieMatch {
                    payload_offset: record,
                    prefix_len: 32 - depth,
                });
            }
            node = record;
        }

        Err(DecodeError::CorruptDatabase(format!(
            "trie walk for {} did not reach the payload region in 32 steps",
            Ipv4Addr::from(ipnum)
        )))
    }

    /// Read one child pointer of a node
    ///
    /// `side` 0 is the left pointer (address bit 0), 1 the right pointer.
    pub fn read_record(&self, node: u32, side: u8) -> Result<u32, DecodeError> {
        let width = self.record_width.bytes();
        let offset = (node as usize)
            .checked_mul(self.record_width.node_bytes())
            .and_then(|o| o.checked_add(side as usize * width))
            .ok_or_else(|| {
                DecodeError::CorruptDatabase(format!("node index {} overflows", node))
            })?;

        read_uint_le(self.data, offset, width).ok_or_else(|| {
            DecodeError::CorruptDatabase(format!(
                "node {} at offset {} lies past the end of the file ({} bytes)",
                node,
                offset,
                self.data.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::types::COUNTRY_BEGIN;

    fn push_u24(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes()[..3]);
    }

    #[test]
    fn test_read_24bit_record() {
        // Node 0: left=1, right=2
        let data = [0x01, 0x00, 0x00, 0x02, 0x00, 0x00];
        let tree = SearchTree::new(&data, RecordWidth::Standard, 10);

        assert_eq!(tree.read_record(0, 0).unwrap(), 1);
        assert_eq!(tree.read_record(0, 1).unwrap(), 2);
    }

    #[test]
    fn test_read_32bit_record() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let tree = SearchTree::new(&data, RecordWidth::Org, u32::MAX);

        assert_eq!(tree.read_record(0, 0).unwrap(), 0x04030201);
        assert_eq!(tree.read_record(0, 1).unwrap(), 0x08070605);
    }

    #[test]
    fn test_first_bit_decides() {
        // Root splits the space in half: 0.0.0.0/1 -> country 1, 128.0.0.0/1 -> country 2
        let mut data = Vec::new();
        push_u24(&mut data, COUNTRY_BEGIN + 1);
        push_u24(&mut data, COUNTRY_BEGIN + 2);
        let tree = SearchTree::new(&data, RecordWidth::Standard, COUNTRY_BEGIN);

        let low = tree.lookup_v4(Ipv4Addr::new(1, 2, 3, 4)).unwrap();
        assert_eq!(low.prefix_len, 1);
        assert_eq!(low.payload_offset, COUNTRY_BEGIN + 1);

        let high = tree.lookup_v4(Ipv4Addr::new(200, 0, 0, 1)).unwrap();
        assert_eq!(high.payload_offset, COUNTRY_BEGIN + 2);
    }

    #[test]
    fn test_full_depth_walk() {
        // A chain of 32 nodes following the all-ones path
        let mut data = Vec::new();
        for node in 0..32u32 {
            push_u24(&mut data, COUNTRY_BEGIN);
            if node == 31 {
                push_u24(&mut data, COUNTRY_BEGIN + 7);
            } else {
                push_u24(&mut data, node + 1);
            }
        }
        let tree = SearchTree::new(&data, RecordWidth::Standard, COUNTRY_BEGIN);

        let m = tree.lookup(u32::MAX).unwrap();
        assert_eq!(m.prefix_len, 32);
        assert_eq!(m.payload_offset, COUNTRY_BEGIN + 7);

        let m = tree.lookup(0x7FFF_FFFF).unwrap();
        assert_eq!(m.prefix_len, 1);
    }

    #[test]
    fn test_self_loop_is_corrupt() {
        // Node 0 points back at itself on both sides
        let data = [0u8; 6];
        let tree = SearchTree::new(&data, RecordWidth::Standard, COUNTRY_BEGIN);
        assert!(matches!(
            tree.lookup(0x0A000001),
            Err(DecodeError::CorruptDatabase(_))
        ));
    }

    #[test]
    fn test_pointer_past_end_is_corrupt() {
        let mut data = Vec::new();
        push_u24(&mut data, 500);
        push_u24(&mut data, 500);
        let tree = SearchTree::new(&data, RecordWidth::Standard, COUNTRY_BEGIN);
        assert!(matches!(
            tree.lookup(0),
            Err(DecodeError::CorruptDatabase(msg)) if msg.contains("past the end")
        ));
    }
}
