use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Saga state-space toolkit for seasonal adjustment.
#[derive(Parser)]
#[command(
    name = "saga",
    version,
    about = "ARMA likelihood evaluation and time-series benchmarking"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Evaluate the exact likelihood of an ARMA model on inline data.
    Arma(ArmaArgs),
    /// Benchmark series under temporal and contemporaneous constraints.
    Benchmark(BenchmarkArgs),
}

/// Arguments for the `arma` subcommand.
#[derive(clap::Args)]
pub struct ArmaArgs {
    /// Path to TOML model file.
    #[arg(short, long, default_value = "arma.toml")]
    pub config: PathBuf,

    /// Override the convergence threshold from the model file.
    #[arg(short, long)]
    pub epsilon: Option<f64>,
}

/// Arguments for the `benchmark` subcommand.
#[derive(clap::Args)]
pub struct BenchmarkArgs {
    /// Path to TOML benchmarking file.
    #[arg(short, long, default_value = "benchmark.toml")]
    pub config: PathBuf,

    /// Write the CSV result here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
