#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Garbage files must fail cleanly or resolve every address without panicking
    if let Ok(db) = geodat::Database::from_bytes(data.to_vec()) {
        let _ = db.info();
        for ip in [0u32, 1, 0x0A00_0001, 0x7F00_0001, 0xC0A8_0101, u32::MAX] {
            let _ = db.lookup_num(ip);
        }
        let _ = geodat::validation::validate_bytes(data, geodat::validation::ValidationLevel::Standard);
    }
});
