//! Database validation for untrusted .dat files
//!
//! Lookups only ever touch the 32 nodes on one address's path, so a damaged
//! file can look healthy until the wrong address is queried. The validator
//! walks the whole trie once and checks:
//!
//! - the trailer (edition, segment boundary, database info)
//! - every child pointer is in bounds
//! - every path reaches the payload region within 32 bits (no cycles)
//! - country indexes fall inside the code tables
//! - city records decode (strict level)
//!
//! # Usage
//!
//! ```rust,no_run
//! use geodat::validation::{validate_database, ValidationLevel};
//! use std::path::Path;
//!
//! let report = validate_database(Path::new("GeoLiteCity.dat"), ValidationLevel::Strict)?;
//!
//! if report.is_valid() {
//!     println!("✓ Database is safe to use");
//! } else {
//!     for error in &report.errors {
//!         println!("  - {}", error);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::countries::COUNTRY_COUNT;
use crate::error::{DecodeError, LoadError};
use crate::file_reader;
use crate::legacy::{
    database_info, DatHeader, RecordDecoder, RecordLayout, SearchTree, TrieMatch, COUNTRY_BEGIN,
};
use serde::Serialize;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::Path;

/// Individual findings reported per category before switching to a count
const MAX_REPORTED: usize = 10;

/// Validation strictness level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ValidationLevel {
    /// Trailer and trie structure only
    Standard,
    /// Also decode every city record the trie points at
    #[default]
    Strict,
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Problems that make lookups fail or return garbage
    pub errors: Vec<String>,
    /// Suspicious but harmless findings
    pub warnings: Vec<String>,
    /// What was checked
    pub info: Vec<String>,
    /// Statistics gathered during the walk
    pub stats: DatabaseStats,
}

/// Database statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    /// File size in bytes
    pub file_size: usize,
    /// Edition name
    pub edition: String,
    /// Pointer width in bytes
    pub record_width: usize,
    /// Segment boundary
    pub segment_boundary: u32,
    /// Offset of the `FF FF FF` trailer, absent for pre-2002 files
    pub structure_info_offset: Option<usize>,
    /// Whether a `\0\0\0` database info string was found
    pub has_database_info: bool,
    /// Trie nodes reached from the root
    pub nodes_visited: usize,
    /// Pointers into the payload region
    pub leaf_count: usize,
    /// Leaves that carry no data
    pub empty_leaf_count: usize,
    /// Deepest prefix length seen
    pub max_prefix_len: u8,
    /// City records decoded successfully
    pub records_decoded: usize,
    /// Nodes reachable by more than one path
    pub shared_nodes: usize,
    /// City trie nodes never reached from the root
    pub orphaned_nodes: Option<usize>,
}

impl ValidationReport {
    /// Check if database passed all validations (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn info(&mut self, msg: impl Into<String>) {
        self.info.push(msg.into());
    }
}

/// Validate a database file
///
/// Only I/O failures are returned as errors. Everything wrong with the
/// contents ends up in the report.
pub fn validate_database(
    path: &Path,
    level: ValidationLevel,
) -> Result<ValidationReport, LoadError> {
    let buffer = file_reader::read_all(path)
        .map_err(|e| LoadError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(validate_bytes(&buffer, level))
}

/// Validate a database already in memory
pub fn validate_bytes(buffer: &[u8], level: ValidationLevel) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.stats.file_size = buffer.len();
    report.info(format!(
        "File size: {} bytes ({} KB)",
        buffer.len(),
        buffer.len() / 1024
    ));

    let header = match DatHeader::from_file(buffer) {
        Ok(header) => header,
        Err(e) => {
            report.error(format!("Invalid trailer: {}", e));
            return report;
        }
    };

    report.stats.edition = header.edition.name().to_string();
    report.stats.record_width = header.record_width.bytes();
    report.stats.structure_info_offset = header.structure_info_offset;
    match header.structure_info_offset {
        Some(offset) => report.info(format!(
            "Structure info at offset {}: {} edition (id {})",
            offset,
            header.edition,
            header.edition.id()
        )),
        None => report.warning("No structure info found; assuming pre-2002 country layout"),
    }

    match database_info(buffer) {
        Some(text) => {
            report.stats.has_database_info = true;
            report.info(format!("Database info: {}", text));
        }
        None => report.warning("No database info string"),
    }

    let Some(layout) = header.edition.layout() else {
        report.error(format!(
            "Unsupported edition: {} (id {})",
            header.edition,
            header.edition.id()
        ));
        return report;
    };
    let Some(boundary) = header.segment_boundary else {
        report.error("No segment boundary");
        return report;
    };
    report.stats.segment_boundary = boundary;

    let node_bytes = header.record_width.node_bytes();
    if buffer.len() < node_bytes {
        report.error(format!(
            "File is smaller than one {}-byte trie node",
            node_bytes
        ));
        return report;
    }

    if let RecordLayout::City { .. } = layout {
        let trie_bytes = boundary as u64 * node_bytes as u64;
        if trie_bytes > buffer.len() as u64 {
            report.error(format!(
                "Trie of {} nodes needs {} bytes, file is {} bytes",
                boundary,
                trie_bytes,
                buffer.len()
            ));
            return report;
        }
        report.info(format!(
            "City trie: {} nodes, {} bytes, payload region {} bytes",
            boundary,
            trie_bytes,
            buffer.len() as u64 - trie_bytes
        ));
    }

    let mut walk = TrieWalk {
        tree: SearchTree::new(buffer, header.record_width, boundary),
        decoder: RecordDecoder::new(buffer, layout, header.record_width, boundary),
        layout,
        level,
        visited: HashSet::new(),
        decoded: HashSet::new(),
        path: Vec::with_capacity(32),
        findings: Findings::default(),
        stats: std::mem::take(&mut report.stats),
    };
    walk.visit(0, 0, 0);
    walk.finish(&mut report);

    if let RecordLayout::City { .. } = layout {
        let orphaned = (boundary as usize).saturating_sub(report.stats.nodes_visited);
        report.stats.orphaned_nodes = Some(orphaned);
        if orphaned > 0 {
            report.warning(format!(
                "Found {} orphaned nodes (exist in trie but unreachable from root)",
                orphaned
            ));
        }
    }

    report
}

/// Findings grouped by kind, each capped at [`MAX_REPORTED`] messages
#[derive(Default)]
struct Findings {
    bad_pointers: Vec<String>,
    bad_pointer_count: usize,
    cycles: Vec<String>,
    cycle_count: usize,
    too_deep: Vec<String>,
    too_deep_count: usize,
    corrupt_records: Vec<String>,
    corrupt_record_count: usize,
    partial_records: Vec<String>,
    partial_record_count: usize,
    unknown_countries: Vec<String>,
    unknown_country_count: usize,
}

fn note(list: &mut Vec<String>, count: &mut usize, msg: String) {
    *count += 1;
    if list.len() < MAX_REPORTED {
        list.push(msg);
    }
}

struct TrieWalk<'a> {
    tree: SearchTree<'a>,
    decoder: RecordDecoder<'a>,
    layout: RecordLayout,
    level: ValidationLevel,
    visited: HashSet<u32>,
    decoded: HashSet<u32>,
    /// Nodes from the root to the current one
    path: Vec<u32>,
    findings: Findings,
    stats: DatabaseStats,
}

impl TrieWalk<'_> {
    /// Visit a node at `depth` (0 = root) covering `network/depth`
    fn visit(&mut self, node: u32, depth: u8, network: u32) {
        self.visited.insert(node);
        self.stats.nodes_visited += 1;
        self.path.push(node);

        for side in 0..2u8 {
            let bit = 31 - depth;
            let child_network = network | (u32::from(side) << bit);
            let prefix_len = depth + 1;

            let record = match self.tree.read_record(node, side) {
                Ok(record) => record,
                Err(e) => {
                    note(
                        &mut self.findings.bad_pointers,
                        &mut self.findings.bad_pointer_count,
                        format!("{}/{}: {}", Ipv4Addr::from(network), depth, e),
                    );
                    continue;
                }
            };

            if record >= self.tree.segment_boundary() {
                self.leaf(record, child_network, prefix_len);
            } else if self.path.contains(&record) {
                note(
                    &mut self.findings.cycles,
                    &mut self.findings.cycle_count,
                    format!(
                        "{}/{}: node {} points back at ancestor {}",
                        Ipv4Addr::from(child_network),
                        prefix_len,
                        node,
                        record
                    ),
                );
            } else if prefix_len == 32 {
                note(
                    &mut self.findings.too_deep,
                    &mut self.findings.too_deep_count,
                    format!(
                        "{}/32: node {} still points at node {} after 32 bits",
                        Ipv4Addr::from(child_network),
                        node,
                        record
                    ),
                );
            } else if self.visited.contains(&record) {
                self.stats.shared_nodes += 1;
            } else {
                self.visit(record, prefix_len, child_network);
            }
        }

        self.path.pop();
    }

    fn leaf(&mut self, record: u32, network: u32, prefix_len: u8) {
        self.stats.leaf_count += 1;
        self.stats.max_prefix_len = self.stats.max_prefix_len.max(prefix_len);
        let cidr = format!("{}/{}", Ipv4Addr::from(network), prefix_len);

        match self.layout {
            RecordLayout::Country => {
                let index = record - COUNTRY_BEGIN;
                if index == 0 {
                    self.stats.empty_leaf_count += 1;
                } else if index - 1 >= COUNTRY_COUNT as u32 {
                    note(
                        &mut self.findings.unknown_countries,
                        &mut self.findings.unknown_country_count,
                        format!("{}: country id {} is outside the code tables", cidr, index - 1),
                    );
                }
            }
            RecordLayout::City { .. } => {
                if record == self.tree.segment_boundary() {
                    self.stats.empty_leaf_count += 1;
                    return;
                }
                if self.level != ValidationLevel::Strict || !self.decoded.insert(record) {
                    return;
                }

                let found = TrieMatch {
                    payload_offset: record,
                    prefix_len,
                };
                match self.decoder.decode(Ipv4Addr::from(network), found) {
                    Ok(_) => self.stats.records_decoded += 1,
                    Err(e @ DecodeError::PartialRecord { .. }) => note(
                        &mut self.findings.partial_records,
                        &mut self.findings.partial_record_count,
                        format!("{}: {}", cidr, e),
                    ),
                    Err(e) => note(
                        &mut self.findings.corrupt_records,
                        &mut self.findings.corrupt_record_count,
                        format!("{}: {}", cidr, e),
                    ),
                }
            }
        }
    }

    fn finish(self, report: &mut ValidationReport) {
        let f = self.findings;
        report.stats = self.stats;

        let groups = [
            (f.bad_pointers, f.bad_pointer_count, "out-of-bounds node pointers", true),
            (f.cycles, f.cycle_count, "trie cycles", true),
            (f.too_deep, f.too_deep_count, "paths deeper than 32 bits", true),
            (f.corrupt_records, f.corrupt_record_count, "corrupt city records", true),
            (f.partial_records, f.partial_record_count, "partial city records", false),
            (f.unknown_countries, f.unknown_country_count, "unknown country ids", false),
        ];

        for (messages, count, what, fatal) in groups {
            if count == 0 {
                continue;
            }
            let mut lines = messages;
            if count > lines.len() {
                lines.push(format!("... {} more {}", count - lines.len(), what));
            }
            for line in lines {
                if fatal {
                    report.error(line);
                } else {
                    report.warning(line);
                }
            }
        }

        if report.stats.shared_nodes > 0 {
            report.warning(format!(
                "{} nodes are reachable by more than one path",
                report.stats.shared_nodes
            ));
        }
    }
}
