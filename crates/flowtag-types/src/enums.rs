//! Enumeration types shared across the flowtag workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Which flow list of an event a flow id is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum FlowKind {
    /// The event participates in the flow; later events may continue it.
    Continuing,
    /// The event is the last hop of the flow. A later event carrying the
    /// same id starts a new flow.
    Terminating,
}

impl FlowKind {
    /// Return `true` for [`FlowKind::Terminating`].
    pub const fn is_terminating(self) -> bool {
        matches!(self, Self::Terminating)
    }
}

impl core::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Continuing => f.write_str("continuing"),
            Self::Terminating => f.write_str("terminating"),
        }
    }
}
