//! Lookup results
//!
//! A lookup produces exactly one of three shapes, picked once by the record
//! decoder: a country-only result, a full city result, or "not found" for
//! networks the database lists without data. All three carry the queried
//! address and the prefix length of the matched network.

use crate::countries;
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// Country-level result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryResult {
    /// Queried address
    pub ip: Ipv4Addr,
    /// Queried address as an integer
    pub numeric_ip: u32,
    /// Prefix length of the matched network
    pub prefix_len: u8,
    /// Zero-based index into the country tables
    pub country_id: Option<u32>,
    /// ISO 3166-1 alpha-2 code (or a GeoIP pseudo-code such as `A1`)
    pub country_code: Option<&'static str>,
    /// Two-letter continent code
    pub continent_code: Option<&'static str>,
}

impl CountryResult {
    /// Build a result, resolving the country id against the static tables
    ///
    /// Ids past the end of the tables keep `country_id` but have no codes.
    pub fn new(ip: Ipv4Addr, prefix_len: u8, country_id: Option<u32>) -> Self {
        CountryResult {
            ip,
            numeric_ip: u32::from(ip),
            prefix_len,
            country_id,
            country_code: country_id.and_then(countries::country_code),
            continent_code: country_id.and_then(countries::continent_code),
        }
    }
}

/// City-level result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityResult {
    /// Address, network and country
    #[serde(flatten)]
    pub country: CountryResult,
    /// Region code (US state, FIPS 10-4 subdivision elsewhere)
    pub region: Option<String>,
    /// City name
    pub city: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// US metro (DMA) code
    pub metro_code: Option<u32>,
    /// US telephone area code
    pub area_code: Option<u32>,
}

impl CityResult {
    /// City result with only the country part filled in
    pub fn new(country: CountryResult) -> Self {
        CityResult {
            country,
            region: None,
            city: None,
            postal_code: None,
            latitude: None,
            longitude: None,
            metro_code: None,
            area_code: None,
        }
    }
}

/// Result of resolving one address
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupResult {
    /// Country edition hit
    Country(CountryResult),
    /// City edition hit
    City(CityResult),
    /// The network is in the trie but carries no data
    NotFound {
        /// Queried address
        ip: Ipv4Addr,
        /// Queried address as an integer
        numeric_ip: u32,
        /// Prefix length of the matched network
        prefix_len: u8,
    },
}

impl LookupResult {
    /// "Not found" result for an address
    pub fn not_found(ip: Ipv4Addr, prefix_len: u8) -> Self {
        LookupResult::NotFound {
            ip,
            numeric_ip: u32::from(ip),
            prefix_len,
        }
    }

    /// Queried address
    pub fn ip(&self) -> Ipv4Addr {
        match self {
            LookupResult::Country(c) => c.ip,
            LookupResult::City(c) => c.country.ip,
            LookupResult::NotFound { ip, .. } => *ip,
        }
    }

    /// Prefix length of the matched network
    pub fn prefix_len(&self) -> u8 {
        match self {
            LookupResult::Country(c) => c.prefix_len,
            LookupResult::City(c) => c.country.prefix_len,
            LookupResult::NotFound { prefix_len, .. } => *prefix_len,
        }
    }

    /// Country part of the result, if any
    pub fn country(&self) -> Option<&CountryResult> {
        match self {
            LookupResult::Country(c) => Some(c),
            LookupResult::City(c) => Some(&c.country),
            LookupResult::NotFound { .. } => None,
        }
    }

    /// City part of the result, if any
    pub fn city(&self) -> Option<&CityResult> {
        match self {
            LookupResult::City(c) => Some(c),
            _ => None,
        }
    }

    /// ISO country code, if the network has one
    pub fn country_code(&self) -> Option<&'static str> {
        self.country().and_then(|c| c.country_code)
    }

    /// Whether the database had data for the address
    pub fn is_found(&self) -> bool {
        !matches!(self, LookupResult::NotFound { .. })
    }

    /// First address of the matched network
    pub fn network(&self) -> Ipv4Addr {
        network_address(self.ip(), self.prefix_len())
    }

    /// Matched network in CIDR notation
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.network(), self.prefix_len())
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let country = self.country_code().unwrap_or("--");
        match self {
            LookupResult::City(c) => write!(
                f,
                "[{} of network {} in city {}, {}]",
                self.ip(),
                self.cidr(),
                c.city.as_deref().unwrap_or("--"),
                country
            ),
            _ => write!(
                f,
                "[{} of network {} in country {}]",
                self.ip(),
                self.cidr(),
                country
            ),
        }
    }
}

/// Mask an address down to its network
pub fn network_address(ip: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    let mask = if prefix_len == 0 {
        0u32
    } else {
        !0u32 << (32 - prefix_len.min(32))
    };
    Ipv4Addr::from(u32::from(ip) & mask)
}
