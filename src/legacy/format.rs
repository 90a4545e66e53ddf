//! Legacy `.dat` Trailer Parsing
//!
//! Everything needed to read a legacy database is at the end of the file:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Trie nodes (segment_boundary × 2 pointers)  │
//! │  Payload records (city editions only)        │
//! │  \0\0\0 <free-text database description>     │  optional
//! │  \xFF\xFF\xFF <edition> [3-byte boundary]    │  optional
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Both markers are found with bounded backward scans. Each attempt reads
//! three bytes and then moves the cursor one byte earlier. Files written
//! before September 2002 have no structure info block and are treated as
//! country databases.

use super::record::latin1_to_string;
use super::types::{
    Edition, RecordWidth, COUNTRY_BEGIN, DATABASE_INFO_MAX_SIZE, DATABASE_INFO_SENTINEL,
    SEGMENT_RECORD_LENGTH, STATE_BEGIN_REV0, STATE_BEGIN_REV1, STRUCTURE_INFO_DELIMITER,
    STRUCTURE_INFO_MAX_SIZE,
};
use crate::endian::read_u24_le;
use crate::error::LoadError;
use log::debug;

/// Edition metadata discovered from the file trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatHeader {
    /// Database edition
    pub edition: Edition,
    /// Width of each trie child pointer
    pub record_width: RecordWidth,
    /// First pointer value that is a payload locator instead of a node index
    ///
    /// `None` for editions whose layout is unknown (Domain, unlisted ids).
    pub segment_boundary: Option<u32>,
    /// Offset of the `\xFF\xFF\xFF` delimiter, `None` for legacy files
    pub structure_info_offset: Option<usize>,
}

impl DatHeader {
    /// Scan the trailer of a database file
    ///
    /// Unsupported editions are reported, not rejected; the caller decides
    /// whether it can decode them. Fails only when a city edition declares a
    /// segment boundary that is cut off by the end of the file.
    pub fn from_file(data: &[u8]) -> Result<Self, LoadError> {
        let Some(delimiter) = find_structure_info(data) else {
            debug!(
                "no structure info in the last {} bytes; assuming pre-2002 country layout",
                STRUCTURE_INFO_MAX_SIZE + 2
            );
            return Ok(Self::legacy());
        };

        let edition_offset = delimiter + STRUCTURE_INFO_DELIMITER.len();
        let edition = data.get(edition_offset).copied().map(Edition::from_id).ok_or_else(|| {
            LoadError::Truncated(format!(
                "structure info at offset {} ends before the edition byte",
                delimiter
            ))
        })?;

        let boundary_offset = edition_offset + 1;
        let stored_boundary = read_u24_le(data, boundary_offset);

        let (segment_boundary, record_width) = match edition {
            Edition::Country | Edition::Proxy | Edition::NetSpeed | Edition::CountryV6 => {
                (Some(COUNTRY_BEGIN), RecordWidth::Standard)
            }
            Edition::RegionRev0 => (Some(STATE_BEGIN_REV0), RecordWidth::Standard),
            Edition::RegionRev1 => (Some(STATE_BEGIN_REV1), RecordWidth::Standard),
            Edition::CityRev0 | Edition::CityRev1 => {
                let boundary = stored_boundary.ok_or_else(|| {
                    LoadError::Truncated(format!(
                        "{} edition needs a {}-byte segment boundary at offset {}, file is {} bytes",
                        edition,
                        SEGMENT_RECORD_LENGTH,
                        boundary_offset,
                        data.len()
                    ))
                })?;
                (Some(boundary), RecordWidth::Standard)
            }
            Edition::AsNum => (stored_boundary, RecordWidth::Standard),
            Edition::Org | Edition::Isp => (stored_boundary, RecordWidth::Org),
            Edition::Domain | Edition::Unknown(_) => (None, RecordWidth::Standard),
        };

        debug!(
            "structure info at offset {}: edition {} (id {}), boundary {:?}, {}-byte records",
            delimiter,
            edition,
            edition.id(),
            segment_boundary,
            record_width.bytes()
        );

        Ok(DatHeader {
            edition,
            record_width,
            segment_boundary,
            structure_info_offset: Some(delimiter),
        })
    }

    /// Header assumed for files without structure info
    pub fn legacy() -> Self {
        DatHeader {
            edition: Edition::Country,
            record_width: RecordWidth::Standard,
            segment_boundary: Some(COUNTRY_BEGIN),
            structure_info_offset: None,
        }
    }
}

/// Find the structure info delimiter (zero allocation)
///
/// Starts three bytes before the end of the file and gives up after
/// [`STRUCTURE_INFO_MAX_SIZE`] attempts. Returns the delimiter's offset.
pub fn find_structure_info(data: &[u8]) -> Option<usize> {
    let start = data.len().checked_sub(STRUCTURE_INFO_DELIMITER.len())?;
    scan_backward(data, start, STRUCTURE_INFO_MAX_SIZE, STRUCTURE_INFO_DELIMITER)
        .map(|(_, offset)| offset)
}

/// Read the free-text database description
///
/// The description sits between a `\0\0\0` sentinel and the structure info
/// block (or the end of the file, for legacy layouts). Returns `None` when no
/// sentinel is found, which is normal for databases built before 2002.
pub fn database_info(data: &[u8]) -> Option<String> {
    let start = match find_structure_info(data) {
        Some(delimiter) => delimiter.checked_sub(DATABASE_INFO_SENTINEL.len())?,
        None => data.len().checked_sub(DATABASE_INFO_SENTINEL.len())?,
    };

    let (attempt, offset) =
        scan_backward(data, start, DATABASE_INFO_MAX_SIZE, DATABASE_INFO_SENTINEL)?;
    let text_start = offset + DATABASE_INFO_SENTINEL.len();
    data.get(text_start..text_start + attempt)
        .map(latin1_to_string)
}

/// Bounded backward search for a 3-byte marker
///
/// Attempt `i` compares the window at `start - i`. Returns the attempt number
/// and the offset of the first match, stopping at the start of the buffer.
fn scan_backward(
    data: &[u8],
    start: usize,
    max_attempts: usize,
    marker: &[u8; 3],
) -> Option<(usize, usize)> {
    (0..max_attempts)
        .map_while(|attempt| start.checked_sub(attempt).map(|offset| (attempt, offset)))
        .find(|&(_, offset)| data.get(offset..offset + marker.len()) == Some(&marker[..]))
}
