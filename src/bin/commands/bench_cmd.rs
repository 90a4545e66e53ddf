use anyhow::{Context, Result};
use geodat::Database;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::cli_utils::{format_bytes, format_number, format_qps};

pub fn cmd_bench(
    database: PathBuf,
    count: usize,
    load_iterations: usize,
    seed: Option<u64>,
) -> Result<()> {
    let load_iterations = load_iterations.max(1);

    println!("=== Geodat Lookup Benchmark ===\n");
    println!("Configuration:");
    println!("  Database:          {}", database.display());
    println!("  Load iterations:   {}", load_iterations);
    println!("  Query iterations:  {}", format_number(count));
    match seed {
        Some(seed) => println!("  Seed:              {}", seed),
        None => println!("  Seed:              random"),
    }
    println!();

    println!("--- Phase 1: Load Database (mmap) ---");
    let mut load_times = Vec::with_capacity(load_iterations);
    for i in 1..=load_iterations {
        let load_start = Instant::now();
        let _db = Database::open(&database)
            .with_context(|| format!("Failed to load database: {}", database.display()))?;
        let load_time = load_start.elapsed();
        load_times.push(load_time);
        println!(
            "  Load #{}: {:.3}ms",
            i,
            load_time.as_micros() as f64 / 1000.0
        );
    }
    let avg_load = load_times.iter().sum::<Duration>() / load_iterations as u32;
    println!("  Average:  {:.3}ms", avg_load.as_micros() as f64 / 1000.0);
    println!();

    let db = Database::open(&database)
        .with_context(|| format!("Failed to load database: {}", database.display()))?;
    println!(
        "--- Phase 2: Random Lookups ({} edition, {}) ---",
        db.edition(),
        format_bytes(db.len())
    );

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    // Generate up front so the timing covers lookups only
    let addresses: Vec<u32> = (0..count).map(|_| rng.random::<u32>()).collect();

    let mut found = 0usize;
    let mut failed = 0usize;
    let bench_start = Instant::now();
    for &ipnum in &addresses {
        match db.lookup_num(ipnum) {
            Ok(result) if result.is_found() => found += 1,
            Ok(_) => {}
            Err(_) => failed += 1,
        }
    }
    let bench_time = bench_start.elapsed();

    let secs = bench_time.as_secs_f64().max(f64::EPSILON);
    let qps = count as f64 / secs;
    println!("  Query count: {}", format_number(count));
    println!("  Total time:  {:.2}s", bench_time.as_secs_f64());
    println!("  QPS:         {} queries/sec", format_qps(qps));
    if count > 0 {
        println!(
            "  Avg latency: {:.2}µs",
            bench_time.as_nanos() as f64 / count as f64 / 1000.0
        );
    }
    println!(
        "  Found:       {}/{}",
        format_number(found),
        format_number(count)
    );
    if failed > 0 {
        println!("  Failed:      {}", format_number(failed));
    }
    println!();
    println!("✓ Benchmark complete");

    Ok(())
}
