mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use geodat::validation::ValidationLevel;
use log::LevelFilter;
use std::path::PathBuf;

use commands::{cmd_batch, cmd_bench, cmd_inspect, cmd_query, cmd_validate};

#[derive(Parser)]
#[command(name = "geodat")]
#[command(
    about = "Offline IP geolocation with legacy GeoIP .dat databases",
    long_about = "geodat - Offline IPv4 geolocation against legacy GeoIP .dat databases\n\n\
    Resolves IPv4 addresses to country or city records using GeoIP Country,\n\
    Proxy, Netspeed and City (rev 0 / rev 1) databases. Files are memory-mapped;\n\
    gzip-compressed databases are decompressed on load.\n\n\
    Examples:\n\
      geodat query GeoIP.dat 8.8.8.8\n\
      geodat inspect GeoLiteCity.dat\n\
      geodat validate GeoLiteCity.dat --verbose\n\
      geodat batch GeoLiteCity.dat access-ips.txt.gz -j 8\n\
      geodat bench GeoIP.dat -n 1000000"
)]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more IPv4 addresses
    Query {
        /// Path to the GeoIP database (.dat or .dat.gz)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Dotted-quad IPv4 addresses
        #[arg(value_name = "IP", required = true)]
        ips: Vec<String>,

        /// Quiet mode - no output, only exit code (0 = found, 1 = not found)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show edition, layout and build information
    Inspect {
        /// Path to the GeoIP database (.dat or .dat.gz)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Walk the whole trie and check the file for damage
    Validate {
        /// Path to the GeoIP database (.dat or .dat.gz)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// How deep to check; strict also decodes every city record
        #[arg(short, long, value_enum, default_value_t = ValidationLevel::Strict)]
        level: ValidationLevel,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,

        /// Show detailed information (warnings and info messages)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Annotate addresses from files or stdin (one per line, NDJSON output)
    Batch {
        /// Path to the GeoIP database (.dat or .dat.gz)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Input files (".gz" is decompressed), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Number of worker threads (default: all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Addresses per parallel batch
        #[arg(long, default_value = "4096")]
        batch_size: usize,

        /// Print throughput statistics to stderr
        #[arg(short, long)]
        stats: bool,
    },

    /// Measure load time and random-address lookup throughput
    Bench {
        /// Path to the GeoIP database (.dat or .dat.gz)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Number of lookups
        #[arg(short = 'n', long, default_value = "1000000")]
        count: usize,

        /// Number of load iterations to average
        #[arg(long, default_value = "3")]
        load_iterations: usize,

        /// Seed for the address generator
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_utils::init_logger(cli.log_level);

    match cli.command {
        Commands::Query {
            database,
            ips,
            quiet,
        } => cmd_query(database, ips, quiet),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
        Commands::Validate {
            database,
            level,
            json,
            verbose,
        } => cmd_validate(database, level, json, verbose),
        Commands::Batch {
            database,
            inputs,
            threads,
            batch_size,
            stats,
        } => cmd_batch(database, inputs, threads, batch_size, stats),
        Commands::Bench {
            database,
            count,
            load_iterations,
            seed,
        } => cmd_bench(database, count, load_iterations, seed),
    }
}
