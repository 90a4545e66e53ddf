//! Legacy GeoIP `.dat` format
//!
//! Internal building blocks of a lookup: trailer scanning ([`format`]),
//! trie descent ([`tree`]) and payload decoding ([`record`]).

pub mod format;
pub mod record;
pub mod tree;
pub mod types;

pub use format::{database_info, find_structure_info, DatHeader};
pub use record::{decode_coordinate, encode_coordinate, RecordDecoder};
pub use tree::{SearchTree, TrieMatch};
pub use types::{
    Edition, RecordLayout, RecordWidth, COUNTRY_BEGIN, DATABASE_INFO_MAX_SIZE,
    FULL_RECORD_LENGTH, STATE_BEGIN_REV0, STATE_BEGIN_REV1, STRUCTURE_INFO_MAX_SIZE,
};
