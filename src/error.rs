/// Error types for the geodat library
use crate::legacy::Edition;
use crate::result::CityResult;
use std::fmt;

/// Errors raised while constructing a [`Database`](crate::Database) handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// I/O errors (open, read, mmap, gzip)
    Io(String),

    /// The trailer names an edition this engine does not decode
    UnsupportedEdition(Edition),

    /// The file is too short for the structure it declares
    Truncated(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "I/O error: {}", msg),
            LoadError::UnsupportedEdition(edition) => write!(
                f,
                "Unsupported database edition: {} (id {}); use a Country or City database",
                edition.name(),
                edition.id()
            ),
            LoadError::Truncated(msg) => write!(f, "Truncated database: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err.to_string())
    }
}

/// Errors raised while decoding a single lookup
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Trie or record structure is impossible (cycle, out-of-bounds pointer,
    /// unterminated string in a full record window)
    CorruptDatabase(String),

    /// The record ran out of bytes before every field was read
    PartialRecord {
        /// First field that could not be read
        field: &'static str,
        /// Everything decoded before `field`
        partial: Box<CityResult>,
    },
}

impl DecodeError {
    /// The fields decoded before a record was cut short, if this is a partial record
    pub fn partial_record(&self) -> Option<&CityResult> {
        match self {
            DecodeError::PartialRecord { partial, .. } => Some(partial),
            DecodeError::CorruptDatabase(_) => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::CorruptDatabase(msg) => {
                write!(f, "Corrupt database: {}; perhaps the file is damaged?", msg)
            }
            DecodeError::PartialRecord { field, partial } => write!(
                f,
                "Partial record for {}: ran out of bytes reading {}",
                partial.country.ip, field
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Errors returned by [`Database::lookup`](crate::Database::lookup)
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    /// Input is not a dotted-quad IPv4 address
    InvalidAddress(String),

    /// The database could not produce a record for the address
    Decode(DecodeError),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidAddress(input) => {
                write!(f, "{:?} is not an IPv4 address", input)
            }
            LookupError::Decode(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Decode(e) => Some(e),
            LookupError::InvalidAddress(_) => None,
        }
    }
}

impl From<DecodeError> for LookupError {
    fn from(err: DecodeError) -> Self {
        LookupError::Decode(err)
    }
}
