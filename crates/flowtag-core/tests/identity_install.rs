//! Process identity publication.
//!
//! Lives in its own test binary: the installed identity is process-wide, so
//! no other test may race to install one.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use flowtag_core::identity::{self, IdentityError, ProcessIdentity};
use flowtag_types::ProcessSalt;

#[test]
fn identity_installs_exactly_once() {
    assert!(identity::installed().is_none());

    let first = ProcessIdentity::new(std::process::id(), ProcessSalt::new(0xA));
    let installed = identity::install(first).expect("first install succeeds");
    assert_eq!(*installed, first);
    assert_eq!(identity::installed().copied(), Some(first));

    let second = ProcessIdentity::new(std::process::id(), ProcessSalt::new(0xB));
    let err = identity::install(second).unwrap_err();
    match err {
        IdentityError::AlreadyInstalled {
            installed_pid,
            installed_salt,
        } => {
            assert_eq!(installed_pid, first.pid());
            assert_eq!(installed_salt, ProcessSalt::new(0xA));
        }
    }

    // The first identity stays in place.
    assert_eq!(identity::installed().map(|id| id.salt()), Some(first.salt()));
}
