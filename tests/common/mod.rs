//! Synthetic legacy `.dat` files for tests and benches
//!
//! Builds a trie from CIDR networks the way the original database tools lay
//! them out: nodes first, then (for city editions) one padding byte and the
//! records, then an optional `\0\0\0` info string and the structure info.

#![allow(dead_code)]

use std::net::Ipv4Addr;

pub const COUNTRY_BEGIN: u32 = 16_776_960;

#[derive(Clone, Copy)]
enum Child {
    Node(usize),
    Leaf(u32),
}

/// Binary trie over the IPv4 space; leaves hold an opaque tag
struct Trie {
    nodes: Vec<[Child; 2]>,
}

impl Trie {
    fn new(default_leaf: u32) -> Self {
        Trie {
            nodes: vec![[Child::Leaf(default_leaf); 2]],
        }
    }

    fn insert(&mut self, network: u32, prefix_len: u8, leaf: u32) {
        assert!((1..=32).contains(&prefix_len), "prefix must be 1..=32");
        let mut node = 0;
        for depth in 0..prefix_len {
            let bit = ((network >> (31 - depth)) & 1) as usize;
            if depth == prefix_len - 1 {
                self.nodes[node][bit] = Child::Leaf(leaf);
                return;
            }
            node = match self.nodes[node][bit] {
                Child::Node(next) => next,
                Child::Leaf(inherited) => {
                    self.nodes.push([Child::Leaf(inherited); 2]);
                    let next = self.nodes.len() - 1;
                    self.nodes[node][bit] = Child::Node(next);
                    next
                }
            };
        }
    }

    fn serialize(&self, leaf_value: impl Fn(u32) -> u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.nodes.len() * 6);
        for node in &self.nodes {
            for child in node {
                let value = match *child {
                    Child::Node(index) => index as u32,
                    Child::Leaf(tag) => leaf_value(tag),
                };
                push_u24(&mut out, value);
            }
        }
        out
    }
}

pub fn push_u24(buf: &mut Vec<u8>, value: u32) {
    assert!(value < 1 << 24, "{} does not fit in 3 bytes", value);
    buf.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// Parse `a.b.c.d/len`
pub fn parse_cidr(cidr: &str) -> (u32, u8) {
    let (addr, len) = cidr.split_once('/').expect("CIDR needs a prefix length");
    let addr: Ipv4Addr = addr.parse().expect("bad network address");
    (u32::from(addr), len.parse().expect("bad prefix length"))
}

/// Country index as stored on disk (table index + 1)
pub fn stored_country(code: &str) -> u32 {
    geodat::countries::country_id(code).expect("unknown country code") + 1
}

pub fn encode_latin1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).expect("not representable in Latin-1"))
        .collect()
}

/// One city record
#[derive(Clone, Debug, Default)]
pub struct CityRecord {
    /// Country code, empty for none
    pub country: &'static str,
    pub region: &'static str,
    pub city: &'static str,
    pub postal: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    /// (metro, area), written only when set
    pub metro_area: Option<(u32, u32)>,
}

impl CityRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let country = if self.country.is_empty() {
            0
        } else {
            stored_country(self.country)
        };
        out.push(country as u8);
        for s in [self.region, self.city, self.postal] {
            out.extend_from_slice(&encode_latin1(s));
            out.push(0);
        }
        push_u24(&mut out, geodat::legacy::encode_coordinate(self.latitude));
        push_u24(&mut out, geodat::legacy::encode_coordinate(self.longitude));
        if let Some((metro, area)) = self.metro_area {
            push_u24(&mut out, metro * 1000 + area);
        }
        out
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Country,
    City,
}

/// Builder for synthetic databases
pub struct DatBuilder {
    kind: Kind,
    edition: u8,
    default_leaf: u32,
    networks: Vec<(u32, u8, u32)>,
    payload: Vec<u8>,
    info: Option<String>,
    structure_info: bool,
}

impl DatBuilder {
    /// Country edition; unlisted space has no country
    pub fn country() -> Self {
        DatBuilder {
            kind: Kind::Country,
            edition: 1,
            default_leaf: COUNTRY_BEGIN,
            networks: Vec::new(),
            payload: Vec::new(),
            info: None,
            structure_info: true,
        }
    }

    /// City edition (rev 1 carries metro/area codes for US records)
    pub fn city(rev1: bool) -> Self {
        DatBuilder {
            kind: Kind::City,
            edition: if rev1 { 2 } else { 6 },
            // Payload offset 0 is the padding byte, meaning "no record"
            default_leaf: 0,
            networks: Vec::new(),
            payload: vec![0],
            info: None,
            structure_info: true,
        }
    }

    /// Override the edition id in the trailer
    pub fn edition(mut self, id: u8) -> Self {
        self.edition = id;
        self
    }

    /// Omit the structure info block (pre-2002 layout)
    pub fn without_structure_info(mut self) -> Self {
        self.structure_info = false;
        self
    }

    pub fn info(mut self, text: &str) -> Self {
        self.info = Some(text.to_string());
        self
    }

    /// Country for addresses no network covers
    pub fn default_country(mut self, code: &str) -> Self {
        assert!(self.kind == Kind::Country);
        self.default_leaf = COUNTRY_BEGIN + stored_country(code);
        self
    }

    /// Map a network to a stored country index (0 = no country)
    pub fn country_index(mut self, cidr: &str, stored_index: u32) -> Self {
        assert!(self.kind == Kind::Country);
        let (network, prefix_len) = parse_cidr(cidr);
        self.networks.push((network, prefix_len, COUNTRY_BEGIN + stored_index));
        self
    }

    pub fn country_network(self, cidr: &str, code: &str) -> Self {
        let stored = stored_country(code);
        self.country_index(cidr, stored)
    }

    pub fn city_network(self, cidr: &str, record: &CityRecord) -> Self {
        let bytes = record.to_bytes();
        self.city_raw(cidr, &bytes)
    }

    /// Map a network to arbitrary record bytes
    pub fn city_raw(mut self, cidr: &str, bytes: &[u8]) -> Self {
        assert!(self.kind == Kind::City);
        let (network, prefix_len) = parse_cidr(cidr);
        let offset = self.payload.len() as u32;
        self.payload.extend_from_slice(bytes);
        self.networks.push((network, prefix_len, offset));
        self
    }

    /// Map a network to "no record"
    pub fn city_empty(mut self, cidr: &str) -> Self {
        assert!(self.kind == Kind::City);
        let (network, prefix_len) = parse_cidr(cidr);
        self.networks.push((network, prefix_len, 0));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        // Shorter prefixes first so longer ones refine them
        self.networks.sort_by_key(|&(_, prefix_len, _)| prefix_len);

        let mut trie = Trie::new(self.default_leaf);
        for &(network, prefix_len, leaf) in &self.networks {
            trie.insert(network, prefix_len, leaf);
        }

        let segments = trie.nodes.len() as u32;
        let mut out = match self.kind {
            Kind::Country => trie.serialize(|value| value),
            Kind::City => trie.serialize(|offset| segments + offset),
        };
        out.extend_from_slice(&self.payload);

        if let Some(info) = &self.info {
            out.extend_from_slice(b"\0\0\0");
            out.extend_from_slice(&encode_latin1(info));
        }

        if self.structure_info {
            out.extend_from_slice(b"\xFF\xFF\xFF");
            out.push(self.edition);
            if self.kind == Kind::City || matches!(self.edition, 2 | 4 | 5 | 6 | 9) {
                push_u24(&mut out, segments);
            }
        }
        out
    }

    /// Number of trie nodes the built file will have
    pub fn node_count(&self) -> usize {
        let mut networks = self.networks.clone();
        networks.sort_by_key(|&(_, prefix_len, _)| prefix_len);
        let mut trie = Trie::new(self.default_leaf);
        for &(network, prefix_len, leaf) in &networks {
            trie.insert(network, prefix_len, leaf);
        }
        trie.nodes.len()
    }
}

/// The country fixture most tests share
///
/// - `10.0.0.0/8` -> table index 5 (`AG`)
/// - `192.168.0.0/16` -> `US`
/// - everything else: no country
pub fn sample_country_db() -> Vec<u8> {
    DatBuilder::country()
        .country_index("10.0.0.0/8", 6)
        .country_network("192.168.0.0/16", "US")
        .info("GEO-106FREE 20240101 Build 1 Copyright (c) 2024 Test")
        .build()
}

pub fn mountain_view() -> CityRecord {
    CityRecord {
        country: "US",
        region: "CA",
        city: "Mountain View",
        postal: "94043",
        latitude: 37.386,
        longitude: -122.0838,
        metro_area: Some((807, 650)),
    }
}

pub fn munich() -> CityRecord {
    CityRecord {
        country: "DE",
        region: "02",
        city: "München",
        postal: "",
        latitude: 48.15,
        longitude: 11.5833,
        metro_area: None,
    }
}

/// City rev 1 fixture: `8.8.0.0/16` Mountain View, `80.0.0.0/8` Munich
pub fn sample_city_db() -> Vec<u8> {
    DatBuilder::city(true)
        .city_network("8.8.0.0/16", &mountain_view())
        .city_network("80.0.0.0/8", &munich())
        .info("GEO-533LITE 20240101 Build 1 Copyright (c) 2024 Test")
        .build()
}
