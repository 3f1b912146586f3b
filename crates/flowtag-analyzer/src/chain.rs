//! Reconstructed flow structures.

use chrono::{DateTime, Utc};
use serde::Serialize;

use flowtag_types::{FlowId, FlowKind, TrackId};

/// One event's participation in a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowHop {
    /// Index of the event in the analyzed slice.
    pub event: usize,
    /// Event name.
    pub name: String,
    /// Track the event was emitted on.
    pub track: TrackId,
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
    /// Whether the event continued or terminated the flow.
    pub kind: FlowKind,
}

/// A causal chain: every event that carried one flow id between the chain's
/// first event and its termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowChain {
    /// The flow id shared by every hop.
    pub id: FlowId,
    /// Ordinal of this chain among chains with the same id. An id reused
    /// after termination starts generation 1, then 2, and so on.
    pub generation: u32,
    /// Hops in causal (timestamp) order.
    pub hops: Vec<FlowHop>,
    /// Whether the last hop terminated the flow.
    pub terminated: bool,
}

impl FlowChain {
    pub(crate) const fn new(id: FlowId, generation: u32) -> Self {
        Self {
            id,
            generation,
            hops: Vec::new(),
            terminated: false,
        }
    }

    /// The first hop, if any.
    pub fn first(&self) -> Option<&FlowHop> {
        self.hops.first()
    }

    /// The latest hop, if any.
    pub fn last(&self) -> Option<&FlowHop> {
        self.hops.last()
    }

    /// Whether the chain ever leaves the process it started in.
    pub fn spans_processes(&self) -> bool {
        self.first().is_some_and(|first| {
            self.hops
                .iter()
                .any(|hop| !hop.track.same_process(first.track))
        })
    }
}

/// A directed edge between two consecutive hops of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowLink {
    /// The flow id linking the two events.
    pub id: FlowId,
    /// Index of the earlier event.
    pub from: usize,
    /// Index of the later event.
    pub to: usize,
    /// Track of the earlier event.
    pub from_track: TrackId,
    /// Track of the later event.
    pub to_track: TrackId,
}

impl FlowLink {
    /// Whether the link connects events of two different processes.
    pub const fn crosses_process(self) -> bool {
        !self.from_track.same_process(self.to_track)
    }

    /// Whether the link connects events of two different threads.
    pub fn crosses_thread(self) -> bool {
        self.from_track != self.to_track
    }
}
