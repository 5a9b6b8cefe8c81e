//! CLI driver for the rmMt index (component C7, spec §4.7 / §6).
//!
//! `rmmt-cli <path> [--mode timing|memory] [--workers N]` loads a
//! balanced-parentheses byte file, builds the index, and prints exactly one
//! reporting line to stdout. Structured logs (`tracing`) describe the run on
//! stderr and never interleave with that line.

mod alloc;
mod error;
mod loader;

use crate::alloc::CountingAlloc;
use crate::error::CliError;
use clap::{Parser, ValueEnum};
use rmmt::build;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

/// Reporting mode selected by `--mode` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Prints `<workers>,<path>,<n>,<seconds>`.
    Timing,
    /// Prints `<path>,<n>,<mem_total_start>,<mem_total_end>,<mem_peak>,<mem_curr_start>,<mem_curr_end>`.
    Memory,
}

/// Build a parallel range min-max tree index over a balanced-parentheses
/// file and report construction timing or memory usage.
#[derive(Debug, Parser)]
#[clap(about, version)]
struct Cli {
    /// Path to a byte file of `(`/`)` characters.
    path: PathBuf,

    /// Reporting mode.
    #[arg(long, value_enum, default_value = "timing")]
    mode: Mode,

    /// Worker-pool size for the parallel builder; defaults to the available
    /// parallelism reported by the runtime.
    #[arg(long)]
    workers: Option<NonZeroUsize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let workers = cli.workers.map_or_else(default_workers, NonZeroUsize::get);

    match cli.mode {
        Mode::Timing => run_timing(&cli.path, workers),
        Mode::Memory => run_memory(&cli.path, workers),
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn run_timing(path: &Path, workers: usize) -> Result<(), CliError> {
    let (bits, n) = loader::load(path)?;
    info!(n, workers, "loaded input");

    let started = Instant::now();
    let index = build(bits, workers)?;
    let elapsed = started.elapsed();

    info!(
        num_chunks = index.num_chunks(),
        height = index.height(),
        internal_nodes = index.internal_nodes(),
        "built rmMt"
    );

    println!("{},{},{},{:.6}", workers, path.display(), n, elapsed.as_secs_f64());
    Ok(())
}

fn run_memory(path: &Path, workers: usize) -> Result<(), CliError> {
    let (bits, n) = loader::load(path)?;
    info!(n, workers, "loaded input");

    let start = alloc::snapshot();
    alloc::reset_peak();

    let index = build(bits, workers)?;

    let end = alloc::snapshot();
    let peak = alloc::peak();

    info!(
        num_chunks = index.num_chunks(),
        height = index.height(),
        "built rmMt"
    );

    println!(
        "{},{},{},{},{},{},{}",
        path.display(),
        n,
        start.total,
        end.total,
        peak,
        start.current,
        end.current,
    );
    Ok(())
}
