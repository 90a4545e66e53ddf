use anyhow::{Context, Result};
use geodat::legacy::RecordLayout;
use geodat::Database;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{format_bytes, format_number};

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let db = Database::open(&database)
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let edition = db.edition();
    let info = db.info();
    let header = db.header();
    let layout = match db.layout() {
        RecordLayout::Country => "country",
        RecordLayout::City { metro_area: true } => "city (with metro/area codes)",
        RecordLayout::City { metro_area: false } => "city",
    };

    if json_output {
        let output = json!({
            "file": database.display().to_string(),
            "size": db.len(),
            "edition": edition,
            "edition_id": edition.id(),
            "layout": layout,
            "record_width": db.record_width().bytes(),
            "segment_boundary": db.segment_boundary(),
            "node_count": db.node_count(),
            "structure_info_offset": header.structure_info_offset,
            "memory_mapped": db.is_mmap(),
            "info": info,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Database: {}", database.display());
    println!("Size:     {}", format_bytes(db.len()));
    println!("Edition:  {} (id {})", edition, edition.id());
    println!("Layout:   {}", layout);
    println!();
    println!("Structure:");
    println!("  Record width:     {} bytes", db.record_width().bytes());
    println!("  Segment boundary: {}", db.segment_boundary());
    if let Some(nodes) = db.node_count() {
        println!("  Trie nodes:       {}", format_number(nodes as usize));
    }
    match header.structure_info_offset {
        Some(offset) => println!("  Structure info:   offset {}", offset),
        None => println!("  Structure info:   ✗ (pre-2002 layout)"),
    }
    println!();
    match info {
        Some(text) => println!("Info: {}", text),
        None => println!("Info: (none)"),
    }

    Ok(())
}
