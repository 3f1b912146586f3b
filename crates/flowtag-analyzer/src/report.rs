//! Analysis results and leak detection.

use serde::Serialize;

use flowtag_types::FlowId;

use crate::chain::{FlowChain, FlowLink};

/// Everything the analyzer reconstructed from one trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReport {
    /// Number of events analyzed.
    pub event_count: usize,
    /// Chains ordered by the timestamp of their first hop.
    pub chains: Vec<FlowChain>,
    /// Edges between consecutive hops, in the order they were discovered.
    pub links: Vec<FlowLink>,
    #[serde(skip)]
    min_hops_for_leak: usize,
}

/// Counters summarizing a [`FlowReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    /// Events analyzed.
    pub events: usize,
    /// Chains reconstructed.
    pub chains: usize,
    /// Links between hops.
    pub links: usize,
    /// Chains closed by a terminating id.
    pub terminated: usize,
    /// Open chains long enough to count as leaked.
    pub leaked: usize,
    /// Chains consisting of a single terminating hop.
    pub orphan_terminations: usize,
    /// Links whose endpoints are in different processes.
    pub cross_process_links: usize,
}

impl FlowReport {
    pub(crate) const fn new(
        event_count: usize,
        chains: Vec<FlowChain>,
        links: Vec<FlowLink>,
        min_hops_for_leak: usize,
    ) -> Self {
        Self {
            event_count,
            chains,
            links,
            min_hops_for_leak,
        }
    }

    /// Chains that never received a terminating id and have at least the
    /// configured number of hops.
    pub fn leaked(&self) -> impl Iterator<Item = &FlowChain> {
        let min_hops = self.min_hops_for_leak;
        self.chains
            .iter()
            .filter(move |chain| !chain.terminated && chain.hops.len() >= min_hops)
    }

    /// Chains whose only hop terminated them: a flow closed with nothing
    /// before it, usually a mismatched id on the opening side.
    pub fn orphan_terminations(&self) -> impl Iterator<Item = &FlowChain> {
        self.chains
            .iter()
            .filter(|chain| chain.terminated && chain.hops.len() == 1)
    }

    /// Links whose endpoints are in different processes.
    pub fn cross_process_links(&self) -> impl Iterator<Item = &FlowLink> {
        self.links.iter().filter(|link| link.crosses_process())
    }

    /// All chains (every generation) carrying `id`.
    pub fn chains_for(&self, id: FlowId) -> impl Iterator<Item = &FlowChain> {
        self.chains.iter().filter(move |chain| chain.id == id)
    }

    /// Counters for logging and dashboards.
    pub fn summary(&self) -> FlowSummary {
        FlowSummary {
            events: self.event_count,
            chains: self.chains.len(),
            links: self.links.len(),
            terminated: self.chains.iter().filter(|c| c.terminated).count(),
            leaked: self.leaked().count(),
            orphan_terminations: self.orphan_terminations().count(),
            cross_process_links: self.cross_process_links().count(),
        }
    }
}
