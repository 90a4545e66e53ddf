use anyhow::{Context, Result};
use geodat::Database;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::lookup_json;

pub fn cmd_query(database: PathBuf, ips: Vec<String>, quiet: bool) -> Result<()> {
    let db = Database::open(&database)
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let outcomes: Vec<_> = ips.iter().map(|ip| (ip, db.lookup(ip))).collect();

    let found = outcomes
        .iter()
        .any(|(_, outcome)| matches!(outcome, Ok(result) if result.is_found()));

    if quiet {
        // Quiet mode: no output, just exit code
        std::process::exit(if found { 0 } else { 1 });
    }

    // Always an array, one entry per address, in input order
    let results = outcomes
        .iter()
        .map(|(ip, outcome)| lookup_json(ip, outcome))
        .collect::<serde_json::Result<Vec<_>>>()
        .context("Failed to serialize results")?;
    println!("{}", serde_json::to_string_pretty(&json!(results))?);

    std::process::exit(if found { 0 } else { 1 });
}
