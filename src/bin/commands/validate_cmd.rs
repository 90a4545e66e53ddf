use anyhow::{Context, Result};
use geodat::validation::{validate_database, DatabaseStats, ValidationLevel, ValidationReport};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cli_utils::{format_bytes, format_number};

/// Findings shown per section unless `--verbose`
const PREVIEW: usize = 3;

pub fn cmd_validate(
    database: PathBuf,
    level: ValidationLevel,
    json_output: bool,
    verbose: bool,
) -> Result<()> {
    let start = Instant::now();
    let report = validate_database(&database, level)
        .with_context(|| format!("Failed to read database: {}", database.display()))?;
    let elapsed = start.elapsed();

    if json_output {
        let output = json!({
            "database": database.display().to_string(),
            "level": level,
            "is_valid": report.is_valid(),
            "elapsed_ms": elapsed.as_millis(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&database, level, &report, verbose);
        println!("Walked trie in {:.1}ms", elapsed.as_secs_f64() * 1000.0);
    }

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(database: &Path, level: ValidationLevel, report: &ValidationReport, verbose: bool) {
    let stats = &report.stats;
    let level = match level {
        ValidationLevel::Standard => "standard (trailer and trie)",
        ValidationLevel::Strict => "strict (trailer, trie and every city record)",
    };

    println!("Database: {}", database.display());
    println!("Level:    {}", level);
    println!();
    print_layout(stats);
    println!();
    print_trie(stats);
    println!();

    print_findings("Errors", &report.errors, true);
    print_findings("Warnings", &report.warnings, verbose);
    if verbose {
        print_findings("Checked", &report.info, true);
    }

    if report.is_valid() {
        println!("✅ VALID: every address resolves without a decode error");
    } else {
        println!(
            "❌ INVALID: {} problem(s) make lookups fail or return wrong data",
            report.errors.len()
        );
    }
}

fn print_layout(stats: &DatabaseStats) {
    println!("Layout:");
    let edition = if stats.edition.is_empty() {
        "unreadable trailer"
    } else {
        stats.edition.as_str()
    };
    println!("  Edition:          {}", edition);
    println!("  File size:        {}", format_bytes(stats.file_size));
    match stats.structure_info_offset {
        Some(offset) => println!("  Structure info:   offset {}", offset),
        None => println!("  Structure info:   none (pre-2002 country layout)"),
    }
    println!(
        "  Database info:    {}",
        if stats.has_database_info { "present" } else { "absent" }
    );
    if stats.record_width > 0 {
        println!("  Record width:     {} bytes", stats.record_width);
        println!("  Segment boundary: {}", stats.segment_boundary);
    }
}

fn print_trie(stats: &DatabaseStats) {
    println!("Trie:");
    println!("  Nodes visited:    {}", format_number(stats.nodes_visited));
    println!("  Shared nodes:     {}", format_number(stats.shared_nodes));
    if let Some(orphaned) = stats.orphaned_nodes {
        println!("  Orphaned nodes:   {}", format_number(orphaned));
    }
    println!(
        "  Leaves:           {} ({} without data)",
        format_number(stats.leaf_count),
        format_number(stats.empty_leaf_count)
    );
    println!("  Deepest prefix:   /{}", stats.max_prefix_len);
    if stats.records_decoded > 0 {
        println!("  Records decoded:  {}", format_number(stats.records_decoded));
    }
}

/// One section of findings; only the first few unless `all`
fn print_findings(title: &str, findings: &[String], all: bool) {
    if findings.is_empty() {
        return;
    }
    println!("{} ({}):", title, findings.len());
    let shown = if all { findings.len() } else { PREVIEW };
    for finding in findings.iter().take(shown) {
        println!("  - {}", finding);
    }
    if findings.len() > shown {
        println!("  ... {} more (use --verbose)", findings.len() - shown);
    }
    println!();
}
