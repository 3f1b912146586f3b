//! Load a trace, analyze it, and report.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use flowtag_analyzer::{FlowAnalyzer, FlowChain, FlowReport, FlowSummary};
use flowtag_core::config::FlowConfig;
use flowtag_core::context::read_json_lines;

use crate::args::Cli;

/// Load the config for an analysis run.
///
/// Only the logging override is applied from `lookup`; the process salt plays
/// no part in analysis, so `FLOWTAG_SALT` is ignored.
pub fn load_config<F>(path: Option<&Path>, lookup: F) -> anyhow::Result<FlowConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = FlowConfig::load(path)?;
    config.apply_logging_overrides_from(lookup);
    Ok(config)
}

/// Analyze the trace named on the command line and report the result.
pub fn run(cli: &Cli, config: &FlowConfig) -> anyhow::Result<FlowSummary> {
    let file = File::open(&cli.trace)
        .with_context(|| format!("failed to open trace {}", cli.trace.display()))?;
    let report = analyze_reader(BufReader::new(file), config)
        .with_context(|| format!("failed to load trace {}", cli.trace.display()))?;

    log_report(&report, cli.verbose);
    let summary = report.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(summary)
}

/// Read JSON-lines events from `reader` and analyze them.
pub fn analyze_reader<R: BufRead>(reader: R, config: &FlowConfig) -> anyhow::Result<FlowReport> {
    let events = read_json_lines(reader)?;
    Ok(FlowAnalyzer::new(config.analyzer.clone()).analyze(&events))
}

fn log_report(report: &FlowReport, verbose: bool) {
    let summary = report.summary();
    info!(
        events = summary.events,
        chains = summary.chains,
        links = summary.links,
        terminated = summary.terminated,
        leaked = summary.leaked,
        orphan_terminations = summary.orphan_terminations,
        cross_process_links = summary.cross_process_links,
        "flow analysis complete"
    );

    if verbose {
        for chain in &report.chains {
            info!(
                id = %chain.id,
                generation = chain.generation,
                hops = chain.hops.len(),
                terminated = chain.terminated,
                path = %describe_path(chain),
                "flow chain"
            );
        }
    }

    for chain in report.leaked() {
        warn!(
            id = %chain.id,
            generation = chain.generation,
            hops = chain.hops.len(),
            last = chain.last().map_or("", |hop| hop.name.as_str()),
            "flow never terminated"
        );
    }

    for chain in report.orphan_terminations() {
        warn!(
            id = %chain.id,
            event = chain.first().map_or("", |hop| hop.name.as_str()),
            "flow terminated without any earlier hop"
        );
    }
}

/// Render a chain as `name@pid:tid -> name@pid:tid -> ...`.
fn describe_path(chain: &FlowChain) -> String {
    chain
        .hops
        .iter()
        .map(|hop| format!("{}@{}", hop.name, hop.track))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use flowtag_core::config::{LOG_ENV_VAR, SALT_ENV_VAR};
    use flowtag_core::context::{TraceRecorder, write_json_lines};
    use flowtag_core::flow::{Flow, TerminatingFlow};
    use flowtag_types::TrackId;

    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn recorded_trace() -> Vec<u8> {
        let mut recorder = TraceRecorder::new(TrackId::new(3, 1));
        recorder.emit_at("open", at(0), [Flow::explicit(1)]);
        recorder.emit_at("close", at(1), [TerminatingFlow::explicit(1)]);
        recorder.emit_at("dangling", at(2), [Flow::explicit(2)]);
        let mut buffer = Vec::new();
        write_json_lines(&mut buffer, recorder.events()).unwrap();
        buffer
    }

    #[test]
    fn analyzes_recorded_trace() {
        let trace = recorded_trace();
        let report = analyze_reader(trace.as_slice(), &FlowConfig::default()).unwrap();
        let summary = report.summary();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.chains, 2);
        assert_eq!(summary.leaked, 1);
    }

    #[test]
    fn bad_salt_in_environment_does_not_block_analysis() {
        let config = load_config(None, |key| match key {
            SALT_ENV_VAR => Some("not-a-salt".to_owned()),
            LOG_ENV_VAR => Some("warn".to_owned()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.identity.salt, None);
    }

    #[test]
    fn malformed_trace_is_an_error() {
        let result = analyze_reader("{oops".as_bytes(), &FlowConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn path_lists_hops_in_order() {
        let trace = recorded_trace();
        let report = analyze_reader(trace.as_slice(), &FlowConfig::default()).unwrap();
        let closed = report.chains.first().unwrap();
        assert_eq!(describe_path(closed), "open@3:1 -> close@3:1");
    }
}
