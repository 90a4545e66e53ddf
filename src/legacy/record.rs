//! Payload record decoding
//!
//! Country editions store the answer in the trie pointer itself. City
//! editions point into a payload region of variable-length records:
//!
//! ```text
//! [country+1: u8][region\0][city (Latin-1)\0][postal\0][lat: u24][lon: u24][metro*1000+area: u24]?
//! ```
//!
//! Coordinates are stored as `(degrees + 180) * 10000`. The metro/area combo
//! only exists in rev 1 city databases and only for US records.

use super::tree::TrieMatch;
use super::types::{RecordLayout, RecordWidth, COUNTRY_BEGIN, FULL_RECORD_LENGTH};
use crate::endian::le_value;
use crate::error::DecodeError;
use crate::result::{CityResult, CountryResult, LookupResult};
use log::warn;
use std::net::Ipv4Addr;

/// Decode a stored coordinate into degrees
#[inline]
pub fn decode_coordinate(raw: u32) -> f64 {
    raw as f64 / 10000.0 - 180.0
}

/// Encode degrees the way the database stores them
#[inline]
pub fn encode_coordinate(degrees: f64) -> u32 {
    ((degrees + 180.0) * 10000.0).round() as u32
}

/// Reinterpret Latin-1 bytes as a UTF-8 string
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Turns trie matches into lookup results
pub struct RecordDecoder<'a> {
    data: &'a [u8],
    layout: RecordLayout,
    record_width: RecordWidth,
    segment_boundary: u32,
}

impl<'a> RecordDecoder<'a> {
    /// Create a decoder for one database buffer
    pub fn new(
        data: &'a [u8],
        layout: RecordLayout,
        record_width: RecordWidth,
        segment_boundary: u32,
    ) -> Self {
        Self {
            data,
            layout,
            record_width,
            segment_boundary,
        }
    }

    /// Decode the payload a trie walk ended on
    pub fn decode(&self, ip: Ipv4Addr, found: TrieMatch) -> Result<LookupResult, DecodeError> {
        match self.layout {
            RecordLayout::Country => Ok(self.decode_country(ip, found)),
            RecordLayout::City { metro_area } => self.decode_city(ip, found, metro_area),
        }
    }

    fn decode_country(&self, ip: Ipv4Addr, found: TrieMatch) -> LookupResult {
        match found.payload_offset.saturating_sub(COUNTRY_BEGIN) {
            0 => LookupResult::not_found(ip, found.prefix_len),
            index => LookupResult::Country(CountryResult::new(
                ip,
                found.prefix_len,
                Some(index - 1),
            )),
        }
    }

    fn decode_city(
        &self,
        ip: Ipv4Addr,
        found: TrieMatch,
        metro_area: bool,
    ) -> Result<LookupResult, DecodeError> {
        if found.payload_offset == self.segment_boundary {
            return Ok(LookupResult::not_found(ip, found.prefix_len));
        }

        let start = self.record_start(found.payload_offset)?;
        let end = start.saturating_add(FULL_RECORD_LENGTH).min(self.data.len());
        let mut cursor = RecordCursor::new(&self.data[start..end]);

        // start < data.len(), so the window holds at least the country byte
        let country_id = cursor
            .read_u8()
            .and_then(|b| b.checked_sub(1))
            .map(u32::from);
        let mut record = CityResult::new(CountryResult::new(ip, found.prefix_len, country_id));

        let region = cursor
            .read_string()
            .map_err(|short| short.into_error("region", &record, start))?;
        record.region = non_empty(latin1_to_string(region));

        let city = cursor
            .read_string()
            .map_err(|short| short.into_error("city", &record, start))?;
        record.city = non_empty(latin1_to_string(city));

        let postal = cursor
            .read_string()
            .map_err(|short| short.into_error("postal_code", &record, start))?;
        record.postal_code = non_empty(latin1_to_string(postal));

        let latitude = cursor
            .read_u24()
            .map_err(|short| short.into_error("latitude", &record, start))?;
        record.latitude = Some(decode_coordinate(latitude));

        let longitude = cursor
            .read_u24()
            .map_err(|short| short.into_error("longitude", &record, start))?;
        record.longitude = Some(decode_coordinate(longitude));

        if metro_area && record.country.country_code == Some("US") {
            let combo = cursor
                .read_u24()
                .map_err(|short| short.into_error("metro_code", &record, start))?;
            record.metro_code = Some(combo / 1000);
            record.area_code = Some(combo % 1000);
        }

        Ok(LookupResult::City(record))
    }

    /// Absolute file offset of a city record
    fn record_start(&self, payload_offset: u32) -> Result<usize, DecodeError> {
        let start = payload_offset as u64
            + (self.record_width.node_bytes() as u64 - 1) * self.segment_boundary as u64;

        usize::try_from(start)
            .ok()
            .filter(|&s| s < self.data.len())
            .ok_or_else(|| {
                DecodeError::CorruptDatabase(format!(
                    "record for pointer {} starts at offset {}, past the end of the file ({} bytes)",
                    payload_offset,
                    start,
                    self.data.len()
                ))
            })
    }
}

/// Why a field could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Short {
    /// The window ended before the field did
    OutOfBytes,
    /// A full-size window contained no terminator for the field
    Unterminated,
}

impl Short {
    fn into_error(self, field: &'static str, record: &CityResult, start: usize) -> DecodeError {
        match self {
            Short::OutOfBytes => {
                warn!(
                    "partial city record at offset {} for {}: ran out of bytes reading {}",
                    start, record.country.ip, field
                );
                DecodeError::PartialRecord {
                    field,
                    partial: Box::new(record.clone()),
                }
            }
            Short::Unterminated => DecodeError::CorruptDatabase(format!(
                "{} of the record at offset {} has no terminator within {} bytes",
                field, start, FULL_RECORD_LENGTH
            )),
        }
    }
}

/// Sequential reader over one record window
struct RecordCursor<'a> {
    window: &'a [u8],
    pos: usize,
}

impl<'a> RecordCursor<'a> {
    fn new(window: &'a [u8]) -> Self {
        Self { window, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.window[self.pos..]
    }

    fn read_u8(&mut self) -> Option<u8> {
        let b = *self.remaining().first()?;
        self.pos += 1;
        Some(b)
    }

    fn read_u24(&mut self) -> Result<u32, Short> {
        let bytes = self.remaining().get(..3).ok_or(Short::OutOfBytes)?;
        self.pos += 3;
        Ok(le_value(bytes))
    }

    fn read_string(&mut self) -> Result<&'a [u8], Short> {
        let rest = self.remaining();
        match memchr::memchr(0, rest) {
            Some(len) => {
                self.pos += len + 1;
                Ok(&rest[..len])
            }
            None if self.window.len() == FULL_RECORD_LENGTH => Err(Short::Unterminated),
            None => Err(Short::OutOfBytes),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
