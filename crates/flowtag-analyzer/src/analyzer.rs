//! Flow reconstruction.
//!
//! Events are visited in timestamp order (ties keep input order). For each
//! event:
//!
//! 1. Every continuing id links the event to the latest hop of the open
//!    chain with that id, or opens a new chain.
//! 2. Every terminating id does the same, then closes the chain. A later
//!    event carrying the id opens a fresh chain with the next generation.
//!
//! An id present in both lists of one event counts as terminating only. An id
//! repeated within one event is visited once.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use flowtag_core::config::AnalyzerConfig;
use flowtag_types::{FlowId, FlowKind, TrackEvent};

use crate::chain::{FlowChain, FlowHop, FlowLink};
use crate::report::FlowReport;

/// Rebuilds flow chains from recorded events.
#[derive(Debug, Clone, Default)]
pub struct FlowAnalyzer {
    config: AnalyzerConfig,
}

impl FlowAnalyzer {
    /// Create an analyzer with the given settings.
    pub const fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Reconstruct every flow chain in `events`.
    ///
    /// Hop and link event indices refer to positions in `events`.
    pub fn analyze(&self, events: &[TrackEvent]) -> FlowReport {
        let mut ordered: Vec<(usize, &TrackEvent)> = events.iter().enumerate().collect();
        ordered.sort_by_key(|(_, event)| event.timestamp);

        let mut state = ReconstructionState::default();
        for (index, event) in ordered {
            let terminating: BTreeSet<FlowId> =
                event.terminating_flow_ids.iter().copied().collect();
            let mut seen = BTreeSet::new();
            for &id in &event.flow_ids {
                if !terminating.contains(&id) && seen.insert(id) {
                    state.visit(index, event, id, FlowKind::Continuing);
                }
            }
            for &id in &event.terminating_flow_ids {
                if seen.insert(id) {
                    state.visit(index, event, id, FlowKind::Terminating);
                }
            }
        }

        let report = state.finish(events.len(), self.config.min_hops_for_leak);
        debug!(
            events = events.len(),
            chains = report.chains.len(),
            links = report.links.len(),
            "flow reconstruction complete"
        );
        report
    }
}

/// Mutable bookkeeping for one reconstruction pass.
#[derive(Debug, Default)]
struct ReconstructionState {
    open: BTreeMap<FlowId, FlowChain>,
    closed: Vec<FlowChain>,
    links: Vec<FlowLink>,
    generations: BTreeMap<FlowId, u32>,
}

impl ReconstructionState {
    fn visit(&mut self, index: usize, event: &TrackEvent, id: FlowId, kind: FlowKind) {
        let generations = &mut self.generations;
        let chain = self.open.entry(id).or_insert_with(|| {
            let generation = generations.entry(id).or_insert(0);
            *generation = generation.saturating_add(1);
            FlowChain::new(id, *generation)
        });

        if let Some(previous) = chain.last() {
            self.links.push(FlowLink {
                id,
                from: previous.event,
                to: index,
                from_track: previous.track,
                to_track: event.track,
            });
        }

        chain.hops.push(FlowHop {
            event: index,
            name: event.name.clone(),
            track: event.track,
            timestamp: event.timestamp,
            kind,
        });

        if kind.is_terminating() {
            chain.terminated = true;
            self.close(id);
        }
    }

    fn close(&mut self, id: FlowId) {
        if let Some(chain) = self.open.remove(&id) {
            self.closed.push(chain);
        }
    }

    fn finish(self, event_count: usize, min_hops_for_leak: usize) -> FlowReport {
        let mut chains = self.closed;
        chains.extend(self.open.into_values());
        chains.sort_by_key(|chain| {
            (
                chain.first().map(|hop| hop.timestamp),
                chain.id,
                chain.generation,
            )
        });
        FlowReport::new(event_count, chains, self.links, min_hops_for_leak)
    }
}
