//! Database API
//!
//! A [`Database`] owns the bytes of one legacy `.dat` file together with the
//! edition metadata discovered from its trailer. Lookups walk the trie and
//! decode the payload the walk ends on; nothing is cached and nothing is
//! mutated after construction, so a handle can be shared across threads.
//!
//! # Examples
//!
//! ```no_run
//! use geodat::Database;
//!
//! let db = Database::open("GeoIP.dat")?;
//!
//! let result = db.lookup("8.8.8.8")?;
//! println!("{} -> {:?}", result.cidr(), result.country_code());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{LoadError, LookupError};
use crate::file_reader;
use crate::legacy::{
    self, DatHeader, Edition, RecordDecoder, RecordLayout, RecordWidth, SearchTree,
};
use crate::result::LookupResult;
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

/// Storage for database data - either owned or memory-mapped
enum DatabaseStorage {
    Owned(Vec<u8>),
    Mmap(Mmap),
}

impl DatabaseStorage {
    fn as_slice(&self) -> &[u8] {
        match self {
            DatabaseStorage::Owned(v) => v.as_slice(),
            DatabaseStorage::Mmap(m) => &m[..],
        }
    }
}

/// Builder for opening a database file
///
/// Created via [`Database::from`]. Memory-maps by default; gzip files are
/// always decompressed into memory.
///
/// ```no_run
/// use geodat::Database;
///
/// let db = Database::from("GeoLiteCity.dat").in_memory().open()?;
/// # Ok::<(), geodat::LoadError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseOpener {
    path: PathBuf,
    mmap: bool,
}

impl DatabaseOpener {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mmap: true,
        }
    }

    /// Choose between memory mapping and reading the file into memory
    pub fn mmap(mut self, enabled: bool) -> Self {
        self.mmap = enabled;
        self
    }

    /// Read the whole file into memory instead of mapping it
    pub fn in_memory(self) -> Self {
        self.mmap(false)
    }

    /// Path this opener loads from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the database with the configured options
    pub fn open(&self) -> Result<Database, LoadError> {
        let display = self.path.display();

        let storage = if self.mmap && !file_reader::is_gzip_path(&self.path) {
            let file = File::open(&self.path)
                .map_err(|e| LoadError::Io(format!("Failed to open {}: {}", display, e)))?;

            // SAFETY: the mapping is read-only and lives as long as the handle.
            // Replacing a database file should be done with an atomic rename.
            let mmap = unsafe { Mmap::map(&file) }
                .map_err(|e| LoadError::Io(format!("Failed to mmap {}: {}", display, e)))?;
            DatabaseStorage::Mmap(mmap)
        } else {
            let data = file_reader::read_all(&self.path)
                .map_err(|e| LoadError::Io(format!("Failed to read {}: {}", display, e)))?;
            DatabaseStorage::Owned(data)
        };

        debug!(
            "loaded {} ({} bytes, {})",
            display,
            storage.as_slice().len(),
            if matches!(storage, DatabaseStorage::Mmap(_)) {
                "mmap"
            } else {
                "in memory"
            }
        );

        Database::from_storage(storage)
    }
}

/// Handle on one legacy GeoIP database
pub struct Database {
    data: DatabaseStorage,
    header: DatHeader,
    layout: RecordLayout,
    segment_boundary: u32,
}

impl Database {
    /// Start configuring how a database file is opened
    pub fn from(path: impl Into<PathBuf>) -> DatabaseOpener {
        DatabaseOpener::new(path)
    }

    /// Open a database file using memory mapping
    ///
    /// Gzip-compressed files (`.gz`) are decompressed into memory instead.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::from(path.as_ref()).open()
    }

    /// Read a database file fully into memory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::from(path.as_ref()).in_memory().open()
    }

    /// Create database from raw bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        Self::from_storage(DatabaseStorage::Owned(data))
    }

    fn from_storage(storage: DatabaseStorage) -> Result<Self, LoadError> {
        let data = storage.as_slice();
        let header = DatHeader::from_file(data)?;

        let layout = header
            .edition
            .layout()
            .ok_or(LoadError::UnsupportedEdition(header.edition))?;

        let segment_boundary = header.segment_boundary.ok_or_else(|| {
            LoadError::Truncated(format!("{} database has no segment boundary", header.edition))
        })?;

        let node_bytes = header.record_width.node_bytes();
        if data.len() < node_bytes {
            return Err(LoadError::Truncated(format!(
                "{} bytes is smaller than one {}-byte trie node",
                data.len(),
                node_bytes
            )));
        }

        // Country boundaries are pointer thresholds, not node counts
        if let RecordLayout::City { .. } = layout {
            let trie_bytes = segment_boundary as u64 * node_bytes as u64;
            if trie_bytes > data.len() as u64 {
                return Err(LoadError::Truncated(format!(
                    "trie of {} nodes needs {} bytes, file is {} bytes",
                    segment_boundary,
                    trie_bytes,
                    data.len()
                )));
            }
        }

        debug!(
            "opened {} database: boundary {}, {}-byte records, {} bytes",
            header.edition,
            segment_boundary,
            header.record_width.bytes(),
            data.len()
        );

        Ok(Self {
            data: storage,
            header,
            layout,
            segment_boundary,
        })
    }

    /// Look up a dotted-quad IPv4 address
    pub fn lookup(&self, ip: &str) -> Result<LookupResult, LookupError> {
        let addr = parse_ipv4(ip)?;
        self.lookup_addr(addr)
    }

    /// Look up an already-parsed address
    pub fn lookup_addr(&self, addr: Ipv4Addr) -> Result<LookupResult, LookupError> {
        let found = self.search_tree().lookup_v4(addr)?;
        Ok(self.decoder().decode(addr, found)?)
    }

    /// Look up an address given as a 32-bit integer
    pub fn lookup_num(&self, ipnum: u32) -> Result<LookupResult, LookupError> {
        self.lookup_addr(Ipv4Addr::from(ipnum))
    }

    /// Free-text build description, absent for pre-2002 databases
    pub fn info(&self) -> Option<String> {
        legacy::database_info(self.as_slice())
    }

    /// Database edition
    pub fn edition(&self) -> Edition {
        self.header.edition
    }

    /// Width of a trie child pointer
    pub fn record_width(&self) -> RecordWidth {
        self.header.record_width
    }

    /// First pointer value that is a payload locator
    pub fn segment_boundary(&self) -> u32 {
        self.segment_boundary
    }

    /// How payloads are decoded
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Scanned trailer metadata
    pub fn header(&self) -> &DatHeader {
        &self.header
    }

    /// Size of the database in bytes
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the database buffer is empty (never true for an opened handle)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the database is memory-mapped
    pub fn is_mmap(&self) -> bool {
        matches!(self.data, DatabaseStorage::Mmap(_))
    }

    /// Raw database bytes
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Number of trie nodes, for city editions
    ///
    /// Country editions use the boundary only as a pointer threshold, so the
    /// node count is not stored anywhere.
    pub fn node_count(&self) -> Option<u32> {
        match self.layout {
            RecordLayout::City { .. } => Some(self.segment_boundary),
            RecordLayout::Country => None,
        }
    }

    /// Trie walker over this database
    pub fn search_tree(&self) -> SearchTree<'_> {
        SearchTree::new(
            self.as_slice(),
            self.header.record_width,
            self.segment_boundary,
        )
    }

    /// Payload decoder for this database
    pub fn decoder(&self) -> RecordDecoder<'_> {
        RecordDecoder::new(
            self.as_slice(),
            self.layout,
            self.header.record_width,
            self.segment_boundary,
        )
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("edition", &self.header.edition)
            .field("record_width", &self.header.record_width)
            .field("segment_boundary", &self.segment_boundary)
            .field("len", &self.len())
            .field("mmap", &self.is_mmap())
            .finish()
    }
}

/// Parse four dot-separated decimal octets
///
/// Surrounding ASCII whitespace is ignored. Each octet is one or more
/// digits with a value of at most 255.
pub fn parse_ipv4(input: &str) -> Result<Ipv4Addr, LookupError> {
    let invalid = || LookupError::InvalidAddress(input.to_string());

    let mut octets = [0u8; 4];
    let mut parts = input.trim_matches(|c: char| c.is_ascii_whitespace()).split('.');

    for octet in octets.iter_mut() {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value = part
            .bytes()
            .try_fold(0u32, |acc, b| {
                acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
            })
            .ok_or_else(invalid)?;
        *octet = u8::try_from(value).map_err(|_| invalid())?;
    }

    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(Ipv4Addr::from(octets))
}

/// Read a database file into memory
pub fn load<P: AsRef<Path>>(path: P) -> Result<Database, LoadError> {
    Database::load(path)
}

/// Look up an address in a database
pub fn lookup(db: &Database, ip: &str) -> Result<LookupResult, LookupError> {
    db.lookup(ip)
}

/// Free-text build description of a database
pub fn database_info(db: &Database) -> Option<String> {
    db.info()
}
