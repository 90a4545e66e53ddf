//! Legacy format type definitions
//!
//! Edition ids, record widths and the fixed offsets from `GeoIP.h`.

use serde::Serialize;
use std::fmt;

/// Structure info delimiter that precedes the edition byte
pub const STRUCTURE_INFO_DELIMITER: &[u8; 3] = b"\xFF\xFF\xFF";

/// Sentinel that introduces the free-text database description
pub const DATABASE_INFO_SENTINEL: &[u8; 3] = b"\0\0\0";

/// Maximum backward attempts when looking for structure info
pub const STRUCTURE_INFO_MAX_SIZE: usize = 20;

/// Maximum backward attempts when looking for the database description
pub const DATABASE_INFO_MAX_SIZE: usize = 100;

/// Width of the segment boundary stored after city/org edition ids
pub const SEGMENT_RECORD_LENGTH: usize = 3;

/// Upper bound on the size of one city record
pub const FULL_RECORD_LENGTH: usize = 50;

/// Segment boundary of every country-family edition
pub const COUNTRY_BEGIN: u32 = 16_776_960;

/// Region edition boundary, pre June 2003
pub const STATE_BEGIN_REV0: u32 = 16_700_000;

/// Region edition boundary, post June 2003
pub const STATE_BEGIN_REV1: u32 = 16_000_000;

/// Database edition, as stored in the byte after the structure info delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edition {
    /// GeoIP Country
    Country,
    /// GeoIP City, post April 2002 (carries US metro/area codes)
    CityRev1,
    /// GeoIP Region, post June 2003
    RegionRev1,
    /// GeoIP ISP
    Isp,
    /// GeoIP Organization
    Org,
    /// GeoIP City, pre April 2002
    CityRev0,
    /// GeoIP Region, pre June 2003
    RegionRev0,
    /// GeoIP Anonymous Proxy
    Proxy,
    /// GeoIP ASN
    AsNum,
    /// GeoIP Netspeed
    NetSpeed,
    /// GeoIP Domain Name
    Domain,
    /// GeoIP Country, IPv6
    CountryV6,
    /// Id not listed in `GeoIP.h`
    Unknown(u8),
}

impl Edition {
    /// Map a raw edition byte to an edition
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => Edition::Country,
            2 => Edition::CityRev1,
            3 => Edition::RegionRev1,
            4 => Edition::Isp,
            5 => Edition::Org,
            6 => Edition::CityRev0,
            7 => Edition::RegionRev0,
            8 => Edition::Proxy,
            9 => Edition::AsNum,
            10 => Edition::NetSpeed,
            11 => Edition::Domain,
            12 => Edition::CountryV6,
            other => Edition::Unknown(other),
        }
    }

    /// Raw edition byte
    pub fn id(self) -> u8 {
        match self {
            Edition::Country => 1,
            Edition::CityRev1 => 2,
            Edition::RegionRev1 => 3,
            Edition::Isp => 4,
            Edition::Org => 5,
            Edition::CityRev0 => 6,
            Edition::RegionRev0 => 7,
            Edition::Proxy => 8,
            Edition::AsNum => 9,
            Edition::NetSpeed => 10,
            Edition::Domain => 11,
            Edition::CountryV6 => 12,
            Edition::Unknown(id) => id,
        }
    }

    /// Human-readable edition name
    pub fn name(self) -> &'static str {
        match self {
            Edition::Country => "Country",
            Edition::CityRev1 => "City (rev 1)",
            Edition::RegionRev1 => "Region (rev 1)",
            Edition::Isp => "ISP",
            Edition::Org => "Organization",
            Edition::CityRev0 => "City (rev 0)",
            Edition::RegionRev0 => "Region (rev 0)",
            Edition::Proxy => "Proxy",
            Edition::AsNum => "ASN",
            Edition::NetSpeed => "Netspeed",
            Edition::Domain => "Domain",
            Edition::CountryV6 => "Country (IPv6)",
            Edition::Unknown(_) => "Unknown",
        }
    }

    /// Record layout this engine decodes for the edition, if any
    pub fn layout(self) -> Option<RecordLayout> {
        match self {
            Edition::Country | Edition::Proxy | Edition::NetSpeed => Some(RecordLayout::Country),
            Edition::CityRev0 => Some(RecordLayout::City { metro_area: false }),
            Edition::CityRev1 => Some(RecordLayout::City { metro_area: true }),
            _ => None,
        }
    }

    /// Whether lookups are supported for this edition
    pub fn is_supported(self) -> bool {
        self.layout().is_some()
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Edition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// How payload offsets are turned into results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// Payload offset encodes a country index directly
    Country,
    /// Payload offset points at a variable-length city record
    City {
        /// Record carries a metro/area code combo for US locations
        metro_area: bool,
    },
}

/// Width of a trie child pointer in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordWidth {
    /// 3 bytes per pointer, 6 bytes per node
    Standard = 3,
    /// 4 bytes per pointer, 8 bytes per node (Org/ISP editions)
    Org = 4,
}

impl RecordWidth {
    /// Size of a single pointer in bytes
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Size of a node (2 pointers) in bytes
    pub fn node_bytes(self) -> usize {
        self.bytes() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edition_ids_round_trip() {
        for id in 0..=u8::MAX {
            assert_eq!(Edition::from_id(id).id(), id);
        }
    }

    #[test]
    fn test_supported_editions() {
        let supported: Vec<u8> = (0..=u8::MAX)
            .filter(|&id| Edition::from_id(id).is_supported())
            .collect();
        assert_eq!(supported, vec![1, 2, 6, 8, 10]);
    }

    #[test]
    fn test_city_layouts() {
        assert_eq!(
            Edition::CityRev1.layout(),
            Some(RecordLayout::City { metro_area: true })
        );
        assert_eq!(
            Edition::CityRev0.layout(),
            Some(RecordLayout::City { metro_area: false })
        );
        assert_eq!(Edition::Org.layout(), None);
    }

    #[test]
    fn test_record_width_sizes() {
        assert_eq!(RecordWidth::Standard.bytes(), 3);
        assert_eq!(RecordWidth::Standard.node_bytes(), 6);
        assert_eq!(RecordWidth::Org.node_bytes(), 8);
    }
}
