//! Flow analysis entry point for recorded flowtag traces.
//!
//! Reads a JSON-lines trace written by `TraceRecorder`, rebuilds every flow
//! chain, and reports leaked flows.
//!
//! ```text
//! trace.jsonl --> read_json_lines --> FlowAnalyzer --> summary (log / JSON)
//! ```
//!
//! Exits non-zero when the trace or config cannot be loaded, or when
//! `--deny-leaks` is set and a leaked flow is found.

mod args;
mod inspect;
mod logging;

use clap::Parser;
use tracing::info;

use crate::args::Cli;

/// Application entry point.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = inspect::load_config(cli.config.as_deref(), |key| std::env::var(key).ok())?;

    logging::init(&config.logging)?;
    info!(
        trace = %cli.trace.display(),
        config = ?cli.config,
        min_hops_for_leak = config.analyzer.min_hops_for_leak,
        "flowtag-inspect starting"
    );

    let outcome = inspect::run(&cli, &config)?;
    if cli.deny_leaks && outcome.leaked > 0 {
        anyhow::bail!("{} leaked flow(s) found", outcome.leaked);
    }
    Ok(())
}
