//! Type-safe wrappers around the raw 64-bit values that travel with trace
//! events.
//!
//! Flow ids and process salts are both plain `u64` on the wire, and mixing
//! them up silently produces ids that join nothing. The newtypes here keep
//! them apart at compile time. Both display as `0x`-prefixed hex, which is
//! how trace viewers render them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a transparent newtype wrapper around `u64` with standard derives.
macro_rules! define_raw_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
            Deserialize, TS,
        )]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner `u64` value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        impl core::fmt::LowerHex for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::LowerHex::fmt(&self.0, f)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_raw_id! {
    /// Identifier of a flow: the join key linking causally related events.
    ///
    /// Opaque. Analysis only ever compares flow ids for equality.
    FlowId
}

define_raw_id! {
    /// Per-process value mixed into process-local ids to make them globally
    /// unique.
    ///
    /// Fixed for the lifetime of a process. The salt is assumed, never
    /// verified, to differ between processes of the same trace.
    ProcessSalt
}

impl ProcessSalt {
    /// Scope a process-local id to the whole trace: `local XOR salt`.
    ///
    /// Two processes with distinct salts map the same local id to distinct
    /// flow ids. Within one process the mapping is a bijection, so distinct
    /// local ids never collide with each other.
    pub const fn scope(self, local: u64) -> FlowId {
        FlowId(local ^ self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_xors_with_salt() {
        let salt = ProcessSalt::new(0xA);
        assert_eq!(salt.scope(0x5), FlowId::new(0xF));
    }

    #[test]
    fn zero_salt_is_identity() {
        let salt = ProcessSalt::default();
        assert_eq!(salt.scope(1234), FlowId::new(1234));
    }

    #[test]
    fn scope_is_self_inverse() {
        let salt = ProcessSalt::new(0xdead_beef_0bad_f00d);
        let scoped = salt.scope(42);
        assert_eq!(salt.scope(scoped.into_inner()), FlowId::new(42));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(FlowId::new(255).to_string(), "0xff");
        assert_eq!(format!("{:x}", ProcessSalt::new(255)), "ff");
    }

    #[test]
    fn flow_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&FlowId::new(u64::MAX)).ok();
        assert_eq!(json.as_deref(), Some("18446744073709551615"));
        let restored: Result<FlowId, _> = serde_json::from_str("15");
        assert_eq!(restored.ok(), Some(FlowId::new(15)));
    }
}
