//! Flow id construction and injection for causal trace correlation.
//!
//! A *flow* links trace events that belong to one causal chain, such as an
//! IPC request and the response that arrives later on another thread or in
//! another process. Events join a flow by carrying its id; the offline
//! analyzer does the joining.
//!
//! This crate decides which id an event carries and writes it into the
//! event. It does not own trace buffers or decide when events are emitted.
//!
//! # Modules
//!
//! - [`flow`] -- [`Flow`] and [`TerminatingFlow`] factories producing
//!   [`FlowMutation`] values.
//! - [`context`] -- The [`EventContext`] seam mutations are applied to, and
//!   a [`TraceRecorder`] that persists events as JSON lines.
//! - [`identity`] -- Process salt, [`FlowAnchor`] per-object identities, and
//!   local flow counters.
//! - [`config`] -- YAML configuration with environment overrides.
//!
//! # Usage
//!
//! ```
//! use flowtag_core::context::TraceRecorder;
//! use flowtag_core::flow::{Flow, TerminatingFlow};
//! use flowtag_core::identity::{LocalFlowCounter, ProcessIdentity};
//! use flowtag_types::ProcessSalt;
//!
//! let identity = ProcessIdentity::new(100, ProcessSalt::new(0xA));
//! let requests = LocalFlowCounter::new();
//! let mut recorder = TraceRecorder::new(identity.track(1));
//!
//! let request = requests.next_id();
//! recorder.emit("send_request", [Flow::process_scoped(request, identity.salt())]);
//! recorder.emit("handle_response", [TerminatingFlow::process_scoped(request, identity.salt())]);
//!
//! assert_eq!(recorder.events().len(), 2);
//! ```
//!
//! [`Flow`]: flow::Flow
//! [`TerminatingFlow`]: flow::TerminatingFlow
//! [`FlowMutation`]: flow::FlowMutation
//! [`EventContext`]: context::EventContext
//! [`TraceRecorder`]: context::TraceRecorder
//! [`FlowAnchor`]: identity::FlowAnchor

pub mod config;
pub mod context;
pub mod flow;
pub mod identity;

pub use config::FlowConfig;
pub use context::{EventContext, TraceRecorder};
pub use flow::{Flow, FlowMutation, TerminatingFlow};
pub use identity::{FlowAnchor, LocalFlowCounter, ProcessIdentity};
