//! File reading with automatic gzip decompression
//!
//! Databases are often shipped as `GeoIP.dat.gz` and address lists as
//! compressed logs. Files ending in `.gz` (case-insensitive) are decompressed
//! transparently; everything else is read as-is.
//!
//! ```rust,no_run
//! use geodat::file_reader;
//! use std::io::BufRead;
//!
//! let reader = file_reader::open("addresses.txt.gz")?;
//! for line in reader.lines() {
//!     println!("{}", line?);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader, Read};
use std::path::Path;

/// Buffer size for file reading (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

/// Whether a path names a gzip file
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Open a file for line-by-line reading
///
/// The path "-" reads from stdin.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;
    Ok(from_file(file, is_gzip_path(path)))
}

/// Wrap an already-opened file, with an explicit gzip flag
pub fn from_file(file: File, is_gzip: bool) -> Box<dyn BufRead + Send> {
    if is_gzip {
        Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(BUFFER_SIZE, file))
    }
}

/// Read a whole file into memory, decompressing `.gz`
pub fn read_all<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    let path = path.as_ref();
    if !is_gzip_path(path) {
        return std::fs::read(path);
    }

    let mut data = Vec::new();
    GzDecoder::new(File::open(path)?).read_to_end(&mut data)?;
    Ok(data)
}
