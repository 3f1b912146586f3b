//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Rebuild flow chains from a recorded trace and report leaked flows.
#[derive(Debug, Parser)]
#[command(name = "flowtag-inspect", version, about, long_about = None)]
pub struct Cli {
    /// JSON-lines trace file, one event per line.
    pub trace: PathBuf,

    /// YAML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Log every chain, not just leaked ones.
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit with an error when any flow leaked.
    #[arg(long)]
    pub deny_leaks: bool,
}
