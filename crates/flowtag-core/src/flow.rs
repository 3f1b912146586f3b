//! Flow tag factories.
//!
//! A call site picks one of the construction strategies below and gets back a
//! [`FlowMutation`]: the computed id plus the list it belongs in. Nothing
//! happens until the emission machinery applies the mutation to the event
//! being built.
//!
//! | Strategy | Id written to the event |
//! |----------|-------------------------|
//! | `explicit(id)` | `id` verbatim |
//! | `process_scoped(id, salt)` | `id ^ salt` |
//! | `from_address(&obj, salt)` | `address_of(obj) ^ salt` |
//! | `from_anchor(&anchor, salt)` | `anchor.value() ^ salt` |
//!
//! [`Flow`] writes to the continuing-flow list and [`TerminatingFlow`] to the
//! terminating-flow list. Otherwise the two are identical.
//!
//! # Uniqueness
//!
//! `explicit` ids are the caller's problem; use it only for ids that are
//! already unique across the trace, e.g. a distributed request id.
//!
//! `process_scoped` ids are unique across processes when the local id is
//! unique within its process and the salt differs between processes.
//!
//! `from_address` inherits that guarantee only while the object is alive.
//! Once it is dropped its address can be handed to an unrelated object and
//! the two flows silently merge. Close the flow with
//! `TerminatingFlow::from_address(self, salt)` from the object's `Drop` impl,
//! or embed a [`FlowAnchor`] and use `from_anchor`, whose value is never
//! reused within a process.

use serde::{Deserialize, Serialize};

use flowtag_types::{FlowId, FlowKind, ProcessSalt};

use crate::context::EventContext;
use crate::identity::FlowAnchor;

// ---------------------------------------------------------------------------
// FlowMutation
// ---------------------------------------------------------------------------

/// A deferred write of one flow id into one event.
///
/// Apply it exactly once, to the event it was created for. Applying it twice
/// appends the id twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[must_use = "a flow mutation does nothing until it is applied to an event"]
pub struct FlowMutation {
    kind: FlowKind,
    id: FlowId,
}

impl FlowMutation {
    /// Create a mutation writing `id` to the list selected by `kind`.
    pub const fn new(kind: FlowKind, id: FlowId) -> Self {
        Self { kind, id }
    }

    /// The list this mutation appends to.
    pub const fn kind(self) -> FlowKind {
        self.kind
    }

    /// The flow id this mutation appends.
    pub const fn id(self) -> FlowId {
        self.id
    }

    /// Append the id to the matching flow list of `ctx`.
    pub fn apply<C: EventContext + ?Sized>(self, ctx: &mut C) {
        match self.kind {
            FlowKind::Continuing => ctx.add_flow_id(self.id),
            FlowKind::Terminating => ctx.add_terminating_flow_id(self.id),
        }
    }
}

/// Apply `mutations` to `ctx` in iteration order.
pub fn apply_all<C, I>(ctx: &mut C, mutations: I)
where
    C: EventContext + ?Sized,
    I: IntoIterator<Item = FlowMutation>,
{
    for mutation in mutations {
        mutation.apply(ctx);
    }
}

/// Return the address of `object` widened to 64 bits.
///
/// Only the data pointer is used; metadata of unsized values (slice length,
/// vtable) is discarded.
fn address_of<T: ?Sized>(object: &T) -> u64 {
    let addr = std::ptr::from_ref(object).cast::<()>().addr();
    // usize is at most 64 bits on every target std supports.
    addr as u64
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Generates the four construction strategies for one flow kind.
macro_rules! define_flow_factory {
    ($name:ident, $kind:expr) => {
        impl $name {
            /// Use `id` verbatim.
            ///
            /// The caller guarantees `id` is unique across every process in
            /// the trace. Intended for flows that cross a process boundary
            /// with an id both sides already agree on.
            pub const fn explicit(id: u64) -> FlowMutation {
                FlowMutation::new($kind, FlowId::new(id))
            }

            /// Scope a process-local `id` with the process salt (`id ^ salt`).
            ///
            /// Lets call sites use a cheap per-process counter without any
            /// cross-process coordination.
            pub const fn process_scoped(id: u64, salt: ProcessSalt) -> FlowMutation {
                Self::explicit(salt.scope(id).into_inner())
            }

            /// Use the address of `object` as a process-local id.
            ///
            /// Only valid while `object` is alive. See the module docs.
            pub fn from_address<T: ?Sized>(object: &T, salt: ProcessSalt) -> FlowMutation {
                Self::process_scoped(address_of(object), salt)
            }

            /// Use the value of `anchor` as a process-local id.
            pub const fn from_anchor(anchor: &FlowAnchor, salt: ProcessSalt) -> FlowMutation {
                Self::process_scoped(anchor.value(), salt)
            }
        }
    };
}

/// Factory for continuing flow tags.
///
/// An event may carry any number of these. Each links the event to the
/// previous event carrying the same id.
///
/// ```
/// use flowtag_core::flow::Flow;
/// use flowtag_types::{FlowId, ProcessSalt, TrackEvent, TrackId};
///
/// let salt = ProcessSalt::new(0xA);
/// let mut event = TrackEvent::new("send", TrackId::new(1, 1), chrono::Utc::now());
/// Flow::process_scoped(0x5, salt).apply(&mut event);
/// assert_eq!(event.flow_ids, vec![FlowId::new(0xF)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    id: FlowId,
}

define_flow_factory!(Flow, FlowKind::Continuing);

#[allow(deprecated)]
impl Flow {
    /// Build a continuing flow tag directly from an explicit id.
    #[deprecated(note = "use `Flow::explicit`, which returns a `FlowMutation`")]
    pub const fn new(id: u64) -> Self {
        Self {
            id: FlowId::new(id),
        }
    }

    /// Append this tag's id to the continuing-flow list of `ctx`.
    #[deprecated(note = "use `Flow::explicit(id).apply(ctx)`")]
    pub fn apply<C: EventContext + ?Sized>(self, ctx: &mut C) {
        ctx.add_flow_id(self.id);
    }
}

impl From<Flow> for FlowMutation {
    fn from(flow: Flow) -> Self {
        Self::new(FlowKind::Continuing, flow.id)
    }
}

/// Factory for terminating flow tags.
///
/// Marks an event as the last hop of a flow. The analyzer reports flows that
/// never receive one as leaked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminatingFlow;

define_flow_factory!(TerminatingFlow, FlowKind::Terminating);
