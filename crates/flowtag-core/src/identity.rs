//! Process identity: the salt that scopes local ids, and per-object anchors.
//!
//! The salt is drawn once per process and never changes. It is published
//! through a single read-only handle ([`install`] / [`installed`]), but the
//! flow factories never read that handle themselves: call sites pass the
//! salt in explicitly, which keeps tests free to use any salt they like.
//!
//! # Design Principles
//!
//! - The salt is random. Nothing verifies it differs from other processes'
//!   salts; with 64 random bits a clash is not a practical concern.
//! - Anchors and local counters only need uniqueness, so all atomics use
//!   `Relaxed` ordering.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use tracing::debug;

use flowtag_types::{ProcessSalt, TrackId};

use crate::config::IdentityConfig;

/// The identity published by [`install`].
static INSTALLED: OnceLock<ProcessIdentity> = OnceLock::new();

/// Next value handed out by [`FlowAnchor::new`]. Starts at 1 so that 0 is
/// never a live anchor.
static NEXT_ANCHOR: AtomicU64 = AtomicU64::new(1);

/// Errors that can occur when publishing the process identity.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// An identity was already installed for this process.
    #[error("process identity already installed (pid {installed_pid}, salt {installed_salt})")]
    AlreadyInstalled {
        /// Pid of the identity that won.
        installed_pid: u32,
        /// Salt of the identity that won.
        installed_salt: ProcessSalt,
    },
}

// ---------------------------------------------------------------------------
// ProcessIdentity
// ---------------------------------------------------------------------------

/// The pid and salt of the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessIdentity {
    pid: u32,
    salt: ProcessSalt,
}

impl ProcessIdentity {
    /// Create an identity from explicit parts (tests, replay).
    pub const fn new(pid: u32, salt: ProcessSalt) -> Self {
        Self { pid, salt }
    }

    /// Identity of the current process with a freshly drawn random salt.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Identity of the current process with a salt drawn from `rng`.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(std::process::id(), ProcessSalt::new(rng.random()))
    }

    /// Identity of the current process, using the configured salt if one is
    /// set and a random one otherwise.
    pub fn from_config(config: &IdentityConfig) -> Self {
        config.salt.map_or_else(Self::generate, |salt| {
            Self::new(std::process::id(), ProcessSalt::new(salt))
        })
    }

    /// Process id.
    pub const fn pid(self) -> u32 {
        self.pid
    }

    /// Process salt.
    pub const fn salt(self) -> ProcessSalt {
        self.salt
    }

    /// Track id for thread `tid` of this process.
    pub const fn track(self, tid: u32) -> TrackId {
        TrackId::new(self.pid, tid)
    }
}

/// Publish `identity` as this process's identity.
///
/// Succeeds exactly once per process. Later calls leave the first identity in
/// place and return [`IdentityError::AlreadyInstalled`].
pub fn install(identity: ProcessIdentity) -> Result<&'static ProcessIdentity, IdentityError> {
    let mut won = false;
    let installed = INSTALLED.get_or_init(|| {
        won = true;
        identity
    });

    if won {
        debug!(
            pid = installed.pid,
            salt = %installed.salt,
            "process identity installed"
        );
        Ok(installed)
    } else {
        Err(IdentityError::AlreadyInstalled {
            installed_pid: installed.pid,
            installed_salt: installed.salt,
        })
    }
}

/// The identity published by [`install`], if any.
pub fn installed() -> Option<&'static ProcessIdentity> {
    INSTALLED.get()
}

// ---------------------------------------------------------------------------
// FlowAnchor
// ---------------------------------------------------------------------------

/// A per-object identity token for correlating an object's own events.
///
/// Unlike a memory address, an anchor's value is never handed out twice in
/// the same process, so a flow keyed on it cannot merge with the flow of an
/// object that later reuses the same memory. Not `Clone`: an anchor belongs
/// to exactly one object.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FlowAnchor(u64);

impl FlowAnchor {
    /// Allocate a fresh anchor.
    pub fn new() -> Self {
        Self(NEXT_ANCHOR.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an anchor from a previously observed value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The process-local value of this anchor.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl Default for FlowAnchor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// LocalFlowCounter
// ---------------------------------------------------------------------------

/// A cheap source of process-local flow ids, meant for `process_scoped`.
///
/// Ids start at 1 and wrap after `u64::MAX`.
#[derive(Debug)]
pub struct LocalFlowCounter(AtomicU64);

impl LocalFlowCounter {
    /// Create a counter whose first id is 1.
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Return the next id.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for LocalFlowCounter {
    fn default() -> Self {
        Self::new()
    }
}
