//! Shared type definitions for flowtag.
//!
//! Every crate in the workspace speaks in these types. They are exported to
//! `TypeScript` via `ts-rs` so the trace viewer renders the same shapes.
//!
//! # Modules
//!
//! - [`ids`] -- `u64` newtypes for flow ids and process salts
//! - [`enums`] -- Flow kind (continuing or terminating)
//! - [`structs`] -- Recorded trace events and their tracks

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::FlowKind;
pub use ids::{FlowId, ProcessSalt};
pub use structs::{TrackEvent, TrackId};
