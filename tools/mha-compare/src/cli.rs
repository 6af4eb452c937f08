//! Command-line interface definitions for mha-compare.

use std::path::PathBuf;

use clap::Parser;

/// Compare MHA TFLOPS performance between two benchmark files.
#[derive(Parser)]
#[command(name = "mha-compare", version, about)]
pub struct Cli {
    /// Path to first MHA benchmark file (the baseline).
    pub file1: PathBuf,

    /// Path to second MHA benchmark file.
    pub file2: PathBuf,

    /// Output filename for the plot.
    #[arg(short = 'o', long, default_value = "mha_tflops_comparison.png")]
    pub output: PathBuf,

    /// TOML file overriding chart size, DPI, colors, and annotation rules.
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Also write the joined rows and summary statistics as JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Print a per-configuration comparison table before the summary.
    #[arg(long)]
    pub table: bool,

    /// Suppress progress output; show only errors and the summary.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output with row counts and timings.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
