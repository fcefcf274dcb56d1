mod generator;
mod query;
mod stats;
mod throughput;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mgraph_core::ShortestPathConfig;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(about = "Benchmark and query harness for the matching graph engine")]
struct Cli {
    /// Maximum log level (error, warn, info, debug, trace).
    #[arg(
        long,
        default_value = "info",
        global = true,
        value_parser = clap::value_parser!(LevelFilter)
    )]
    log_level: LevelFilter,
    /// Worker threads for the rayon pool; 0 keeps the rayon default.
    #[arg(long, default_value_t = 0, global = true)]
    threads: usize,
    /// Run shortest-path preprocessing on the calling thread only.
    #[arg(long, global = true)]
    sequential: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Gen {
        #[arg(long, default_value = "bench.dem")]
        dem: String,
        #[arg(long, default_value = "bench.b8")]
        b8: String,
        #[arg(long, default_value_t = 21)]
        size: usize,
        #[arg(long, default_value_t = 100_000)]
        shots: usize,
        #[arg(long, default_value_t = 0.005)]
        p: f64,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
    Query {
        #[arg(short, long)]
        dem: String,
        #[arg(short, long)]
        source: usize,
        #[arg(short, long)]
        target: usize,
    },
    Run {
        #[arg(short, long)]
        dem: String,
        #[arg(short, long)]
        b8: String,
        #[arg(long)]
        detectors: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()?;
    }
    let config = ShortestPathConfig {
        parallel: !cli.sequential,
    };

    match cli.command {
        Commands::Gen {
            dem,
            b8,
            size,
            shots,
            p,
            seed,
        } => {
            generator::generate_grid_data(&dem, &b8, size, shots, p, seed)?;
        }
        Commands::Query {
            dem,
            source,
            target,
        } => {
            query::run_query(&dem, source, target, config)?;
        }
        Commands::Run { dem, b8, detectors } => {
            throughput::run_benchmark(&dem, &b8, detectors, config)?;
        }
    }
    Ok(())
}
