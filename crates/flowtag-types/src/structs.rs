//! Recorded trace event structures.
//!
//! A [`TrackEvent`] is the minimal record the rest of the workspace needs to
//! reason about flows: where it happened, when, and which flows it carries.
//! Anything else a real trace event holds (args, categories, durations) is
//! outside this workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::FlowId;

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// The thread (and owning process) an event was emitted on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct TrackId {
    /// Process id.
    pub pid: u32,
    /// Thread id within the process.
    pub tid: u32,
}

impl TrackId {
    /// Create a track id from a process and thread id.
    pub const fn new(pid: u32, tid: u32) -> Self {
        Self { pid, tid }
    }

    /// Return `true` if both tracks belong to the same process.
    pub const fn same_process(self, other: Self) -> bool {
        self.pid == other.pid
    }
}

impl core::fmt::Display for TrackId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.pid, self.tid)
    }
}

// ---------------------------------------------------------------------------
// TrackEvent
// ---------------------------------------------------------------------------

/// A trace event together with the flows it participates in.
///
/// Both flow lists are ordered and append-only while the event is being
/// built. The order is the order in which flow mutations were applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrackEvent {
    /// Event name as shown in the trace viewer.
    pub name: String,
    /// Thread the event was emitted on.
    pub track: TrackId,
    /// Wall-clock time the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// Flows this event continues.
    #[serde(default)]
    pub flow_ids: Vec<FlowId>,
    /// Flows this event terminates.
    #[serde(default)]
    pub terminating_flow_ids: Vec<FlowId>,
}

impl TrackEvent {
    /// Create an event with empty flow lists.
    pub fn new(name: impl Into<String>, track: TrackId, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            track,
            timestamp,
            flow_ids: Vec::new(),
            terminating_flow_ids: Vec::new(),
        }
    }

    /// Return `true` if the event carries no flow ids at all.
    pub fn has_no_flows(&self) -> bool {
        self.flow_ids.is_empty() && self.terminating_flow_ids.is_empty()
    }
}
