//! Geodat - Offline Reader for Legacy GeoIP Databases
//!
//! Geodat resolves IPv4 addresses against legacy GeoIP `.dat` files
//! (`GeoIP.dat`, `GeoLiteCity.dat` and friends) without any network access.
//! Country editions answer with a country and continent code; city editions
//! add region, city, postal code, coordinates and, for the US, metro and area
//! codes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use geodat::Database;
//!
//! let db = Database::open("GeoLiteCity.dat")?;
//!
//! let result = db.lookup("8.8.8.8")?;
//! if let Some(city) = result.city() {
//!     println!("{:?}, {:?}", city.city, city.country.country_code);
//! }
//! println!("{}", result);
//!
//! if let Some(info) = db.info() {
//!     println!("built from: {}", info);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  Legacy .dat File                    │
//! ├──────────────────────────────────────┤
//! │  1. Binary trie (24/32-bit pointers) │
//! │  2. City records (city editions)     │
//! │  3. \0\0\0 database info             │
//! │  4. \xFF\xFF\xFF edition trailer     │
//! └──────────────────────────────────────┘
//!          ↓ mmap() or read()
//! ┌──────────────────────────────────────┐
//! │  Database handle (immutable, Sync)   │
//! │  32 node reads + 1 record per lookup │
//! └──────────────────────────────────────┘
//! ```
//!
//! Only the Country, Proxy, Netspeed and City (rev 0 / rev 1) editions are
//! decoded. Other editions are recognized and rejected at load time.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Country and continent code tables
pub mod countries;
/// Database handle and lookups
pub mod database;
pub mod endian;
/// Error types
pub mod error;
pub mod file_reader;
/// Legacy `.dat` format internals
pub mod legacy;
pub mod reload;
pub mod result;
pub mod validation;

pub use crate::database::{database_info, load, lookup, parse_ipv4, Database, DatabaseOpener};
pub use crate::error::{DecodeError, LoadError, LookupError};
pub use crate::legacy::{Edition, RecordWidth};
pub use crate::reload::{ReloadCallback, ReloadEvent, SharedDatabase};
#[cfg(feature = "watch")]
pub use crate::reload::Watch;
pub use crate::result::{CityResult, CountryResult, LookupResult};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert!(!VERSION.is_empty());
    }
}
