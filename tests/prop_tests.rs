//! Property tests: every address resolves, however the trie is shaped

mod common;

use common::{mountain_view, DatBuilder};
use geodat::Database;
use proptest::prelude::*;
use std::net::Ipv4Addr;

const CODES: [&str; 6] = ["US", "GB", "DE", "FR", "JP", "BR"];

/// Random country databases: up to 16 networks of any prefix length
fn country_db() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((any::<u32>(), 1u8..=32, 0usize..CODES.len()), 0..16).prop_map(
        |networks| {
            let mut builder = DatBuilder::country();
            for (addr, prefix_len, code) in networks {
                let cidr = format!("{}/{}", Ipv4Addr::from(addr), prefix_len);
                builder = builder.country_network(&cidr, CODES[code]);
            }
            builder.build()
        },
    )
}

proptest! {
    #[test]
    fn every_address_resolves(data in country_db(), addr in any::<u32>()) {
        let db = Database::from_bytes(data).unwrap();
        let result = db.lookup_num(addr).unwrap();
        prop_assert!((1..=32).contains(&result.prefix_len()));
        prop_assert_eq!(result.ip(), Ipv4Addr::from(addr));
    }

    #[test]
    fn lookup_paths_agree(data in country_db(), addr in any::<u32>()) {
        let db = Database::from_bytes(data).unwrap();
        let ip = Ipv4Addr::from(addr);
        let by_num = db.lookup_num(addr).unwrap();
        prop_assert_eq!(&by_num, &db.lookup(&ip.to_string()).unwrap());
        prop_assert_eq!(&by_num, &db.lookup_addr(ip).unwrap());
    }

    #[test]
    fn matched_network_contains_address(data in country_db(), addr in any::<u32>()) {
        let db = Database::from_bytes(data).unwrap();
        let result = db.lookup_num(addr).unwrap();
        // Every address in the reported network resolves the same way
        let host_bits = u32::MAX.checked_shr(u32::from(result.prefix_len())).unwrap_or(0);
        let last = u32::from(result.network()) | host_bits;
        let other = db.lookup_num(last).unwrap();
        prop_assert_eq!(other.country_code(), result.country_code());
        prop_assert_eq!(other.prefix_len(), result.prefix_len());
    }

    #[test]
    fn city_lookups_never_fail(addr in any::<u32>(), prefix_len in 1u8..=32) {
        let cidr = format!("{}/{}", Ipv4Addr::from(addr), prefix_len);
        let db = Database::from_bytes(
            DatBuilder::city(true).city_network(&cidr, &mountain_view()).build(),
        )
        .unwrap();
        let result = db.lookup_num(addr).unwrap();
        prop_assert_eq!(result.prefix_len(), prefix_len);
        let city = result.city().unwrap();
        prop_assert_eq!(city.city.as_deref(), Some("Mountain View"));
    }

    #[test]
    fn garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..512), addr in any::<u32>()) {
        if let Ok(db) = Database::from_bytes(data) {
            let _ = db.lookup_num(addr);
            let _ = db.info();
        }
    }

    #[test]
    fn parse_matches_std(addr in any::<u32>()) {
        let ip = Ipv4Addr::from(addr);
        prop_assert_eq!(geodat::parse_ipv4(&ip.to_string()).unwrap(), ip);
    }
}
