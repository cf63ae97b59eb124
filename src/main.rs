use std::{path::PathBuf, time::Duration};

use anyhow::{Context, ensure};
use clap::{Parser, ValueEnum};
use log::info;

use synched_scan::{BarrierMode, ScanConfig, ScanEngine, io};

/// Computes the inclusive prefix sum of an integer array with a barrier-synchronized
/// Hillis–Steele scan.
#[derive(Parser, Debug)]
#[command(name = "synched-scan", version, about)]
struct Cli {
    /// Number of values to read from INPUT
    length: usize,

    /// Number of workers (clamped to LENGTH)
    workers: usize,

    /// Whitespace-separated integers
    input: PathBuf,

    /// Destination for the prefix sums, one per line
    output: PathBuf,

    /// How workers register at the barrier
    #[arg(long, value_enum, default_value_t = Registration::Unordered)]
    barrier: Registration,

    /// Fail instead of hanging when a barrier wait exceeds this many milliseconds
    #[arg(long = "barrier-timeout-ms", value_name = "MS")]
    barrier_timeout_ms: Option<u64>,

    /// Print per-round timings
    #[arg(long)]
    profile: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Registration {
    /// Workers take turns by id
    Ordered,
    /// Workers register in any order
    Unordered,
}

impl From<Registration> for BarrierMode {
    fn from(registration: Registration) -> Self {
        match registration {
            Registration::Ordered => BarrierMode::Ordered,
            Registration::Unordered => BarrierMode::Unordered,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    ensure!(cli.length > 0, "LENGTH must be a positive integer");
    ensure!(cli.workers > 0, "WORKERS must be a positive integer");

    let input = io::load_array(&cli.input, cli.length).context("invalid input file")?;

    let config = ScanConfig::default()
        .with_workers(cli.workers)
        .with_barrier_mode(cli.barrier.into())
        .with_barrier_timeout(cli.barrier_timeout_ms.map(Duration::from_millis));
    let output = ScanEngine::new(config)
        .run(&input)
        .context("prefix sum failed")?;

    io::store_array(&cli.output, &output.values).context("unable to write the output file")?;
    info!(
        "wrote {} values to {} ({} rounds, result on {:?})",
        output.values.len(),
        cli.output.display(),
        output.rounds,
        output.result_side
    );

    if cli.profile {
        output.stats.plot();
    }

    Ok(())
}
