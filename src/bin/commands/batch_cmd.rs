use anyhow::{Context, Result};
use geodat::{file_reader, Database};
use rayon::prelude::*;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use crate::cli_utils::{format_number, format_qps, lookup_json};

#[derive(Default)]
struct BatchStats {
    lines: usize,
    found: usize,
    not_found: usize,
    failed: usize,
}

pub fn cmd_batch(
    database: PathBuf,
    inputs: Vec<PathBuf>,
    threads: Option<usize>,
    batch_size: usize,
    show_stats: bool,
) -> Result<()> {
    let db = Database::open(&database)
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads.filter(|&n| n > 0) {
        pool = pool.num_threads(n);
    }
    let pool = pool.build().context("Failed to start worker threads")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut stats = BatchStats::default();
    let batch_size = batch_size.max(1);
    let start = Instant::now();

    for input in &inputs {
        let reader = file_reader::open(input)
            .with_context(|| format!("Failed to open input: {}", input.display()))?;

        let mut batch = Vec::with_capacity(batch_size);
        for line in reader.lines() {
            let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            batch.push(trimmed.to_string());
            if batch.len() == batch_size {
                run_batch(&pool, &db, &batch, &mut out, &mut stats)?;
                batch.clear();
            }
        }
        run_batch(&pool, &db, &batch, &mut out, &mut stats)?;
    }
    out.flush()?;

    if show_stats {
        let elapsed = start.elapsed();
        eprintln!("[INFO] Processed {} addresses in {:.2}s", format_number(stats.lines), elapsed.as_secs_f64());
        eprintln!(
            "[INFO] Found: {}, not found: {}, failed: {}",
            format_number(stats.found),
            format_number(stats.not_found),
            format_number(stats.failed)
        );
        if elapsed.as_secs_f64() > 0.0 {
            eprintln!(
                "[INFO] Throughput: {} lookups/sec on {} threads",
                format_qps(stats.lines as f64 / elapsed.as_secs_f64()),
                pool.current_num_threads()
            );
        }
    }

    Ok(())
}

/// Look up one batch in parallel and write it out in input order
fn run_batch(
    pool: &rayon::ThreadPool,
    db: &Database,
    batch: &[String],
    out: &mut impl Write,
    stats: &mut BatchStats,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }

    let rows: Vec<(serde_json::Value, Option<bool>)> = pool
        .install(|| {
            batch
                .par_iter()
                .map(|ip| {
                    let outcome = db.lookup(ip);
                    let found = outcome.as_ref().ok().map(|r| r.is_found());
                    lookup_json(ip, &outcome).map(|row| (row, found))
                })
                .collect::<serde_json::Result<Vec<_>>>()
        })
        .context("Failed to serialize results")?;

    for (row, found) in rows {
        stats.lines += 1;
        match found {
            Some(true) => stats.found += 1,
            Some(false) => stats.not_found += 1,
            None => stats.failed += 1,
        }
        serde_json::to_writer(&mut *out, &row)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
