//! Offline flow reconstruction for flowtag traces.
//!
//! Recorded events carry nothing but flow ids to tie them together. This
//! crate joins events on those ids, rebuilds each causal chain in timestamp
//! order, and reports flows that were opened but never terminated.
//!
//! # Modules
//!
//! - [`analyzer`] -- [`FlowAnalyzer`]: the reconstruction pass.
//! - [`chain`] -- [`FlowChain`], [`FlowHop`], and [`FlowLink`] result types.
//! - [`report`] -- [`FlowReport`] queries and the [`FlowSummary`] counters.
//!
//! # Usage
//!
//! ```
//! use flowtag_analyzer::FlowAnalyzer;
//! use flowtag_core::context::TraceRecorder;
//! use flowtag_core::flow::{Flow, TerminatingFlow};
//! use flowtag_types::TrackId;
//!
//! let mut recorder = TraceRecorder::new(TrackId::new(1, 1));
//! recorder.emit("request", [Flow::explicit(42)]);
//! recorder.emit("response", [TerminatingFlow::explicit(42)]);
//!
//! let report = FlowAnalyzer::default().analyze(recorder.events());
//! assert_eq!(report.summary().leaked, 0);
//! assert_eq!(report.links.len(), 1);
//! ```

pub mod analyzer;
pub mod chain;
pub mod report;

pub use analyzer::FlowAnalyzer;
pub use chain::{FlowChain, FlowHop, FlowLink};
pub use report::{FlowReport, FlowSummary};
