#![no_main]
use libfuzzer_sys::fuzz_target;
use std::net::Ipv4Addr;

#[path = "../../tests/common/mod.rs"]
mod common;

thread_local! {
    static CITY_DB: geodat::Database =
        geodat::Database::from_bytes(common::sample_city_db()).expect("fixture database");
}

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    CITY_DB.with(|db| {
        let outcome = db.lookup(s);

        // Anything std accepts must parse to the same address
        if let Ok(ip) = s.parse::<Ipv4Addr>() {
            assert_eq!(geodat::parse_ipv4(s).ok(), Some(ip));
            assert_eq!(outcome.ok(), db.lookup_addr(ip).ok());
        }
    });
});
