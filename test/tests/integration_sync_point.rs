//! Synchronization point barriers: registration and announcement, the
//! federation-wide and scoped synchronized checks, label retirement, and
//! resignation counting as implicit achievement.

use std::collections::HashSet;
use std::time::Duration;

use fedsim_federate::FederateError;
use fedsim_shared::{Callback, SyncError};
use fedsim_test::{expect_callback, TestFederation};

fn federation() -> TestFederation {
    let _ = env_logger::builder().is_test(true).try_init();
    TestFederation::new(&[1, 2, 3], Duration::ZERO)
}

#[test]
fn federation_wide_barrier() {
    let federation = federation();

    federation
        .federate(1)
        .register_sync_point("ready", b"tag".to_vec(), HashSet::new())
        .unwrap();
    federation.pump();

    expect_callback(&federation.federate(1), "SyncRegistrationSucceeded", |callback| {
        matches!(callback, Callback::SyncRegistrationSucceeded { label } if label == "ready")
    });
    for handle in [2, 3] {
        expect_callback(&federation.federate(handle), "SyncPointAnnounced", |callback| {
            matches!(
                callback,
                Callback::SyncPointAnnounced { label, tag }
                    if label == "ready" && tag == b"tag"
            )
        });
    }

    // A label in use registers as a failure callback, not an error.
    federation
        .federate(2)
        .register_sync_point("ready", Vec::new(), HashSet::new())
        .unwrap();
    federation.pump();
    expect_callback(&federation.federate(2), "SyncRegistrationFailed", |callback| {
        matches!(callback, Callback::SyncRegistrationFailed { label, .. } if label == "ready")
    });

    // Nobody synchronizes until the last member achieves.
    federation.federate(1).achieve_sync_point("ready").unwrap();
    federation.pump();
    federation.federate(2).achieve_sync_point("ready").unwrap();
    federation.pump();
    for handle in [1, 2, 3] {
        let callbacks = federation.federate(handle).drain_callbacks();
        assert!(
            !callbacks
                .iter()
                .any(|callback| matches!(callback, Callback::FederationSynchronized { .. })),
            "[{handle}] synchronized before every federate achieved"
        );
    }

    federation.federate(3).achieve_sync_point("ready").unwrap();
    federation.pump();
    for handle in [1, 2, 3] {
        expect_callback(&federation.federate(handle), "FederationSynchronized", |callback| {
            matches!(callback, Callback::FederationSynchronized { label } if label == "ready")
        });
    }

    // Synchronizing retired the label; it can be registered again.
    federation
        .federate(2)
        .register_sync_point("ready", Vec::new(), HashSet::new())
        .unwrap();
    federation.pump();
    expect_callback(&federation.federate(2), "SyncRegistrationSucceeded", |callback| {
        matches!(callback, Callback::SyncRegistrationSucceeded { label } if label == "ready")
    });
}

#[test]
fn scoped_barrier_skips_out_of_scope_members() {
    let federation = federation();

    federation
        .federate(1)
        .register_sync_point("pair", Vec::new(), [1, 2].into())
        .unwrap();
    federation.pump();

    // Federate 3 is out of scope: no announcement for it.
    let callbacks = federation.federate(3).drain_callbacks();
    assert!(
        !callbacks
            .iter()
            .any(|callback| matches!(callback, Callback::SyncPointAnnounced { .. })),
        "out-of-scope federate heard the announcement"
    );

    federation.federate(1).achieve_sync_point("pair").unwrap();
    federation.pump();
    federation.federate(2).achieve_sync_point("pair").unwrap();
    federation.pump();

    for handle in [1, 2] {
        expect_callback(&federation.federate(handle), "FederationSynchronized", |callback| {
            matches!(callback, Callback::FederationSynchronized { label } if label == "pair")
        });
    }
    let callbacks = federation.federate(3).drain_callbacks();
    assert!(
        !callbacks
            .iter()
            .any(|callback| matches!(callback, Callback::FederationSynchronized { .. })),
        "out-of-scope federate was synchronized"
    );

    // The label is retired on observers too.
    federation
        .federate(3)
        .register_sync_point("pair", Vec::new(), HashSet::new())
        .unwrap();
    federation.pump();
    expect_callback(&federation.federate(3), "SyncRegistrationSucceeded", |callback| {
        matches!(callback, Callback::SyncRegistrationSucceeded { label } if label == "pair")
    });
}

#[test]
fn scope_naming_unknown_federate_fails_registration() {
    let federation = federation();
    federation
        .federate(1)
        .register_sync_point("ghost", Vec::new(), [9].into())
        .unwrap();
    expect_callback(&federation.federate(1), "SyncRegistrationFailed", |callback| {
        matches!(
            callback,
            Callback::SyncRegistrationFailed { label, reason }
                if label == "ghost" && reason.contains("[9]")
        )
    });
}

#[test]
fn resignation_counts_as_achievement() {
    let federation = federation();

    federation
        .federate(1)
        .register_sync_point("exit", Vec::new(), HashSet::new())
        .unwrap();
    federation.pump();
    federation.federate(1).achieve_sync_point("exit").unwrap();
    federation.federate(2).achieve_sync_point("exit").unwrap();
    federation.pump();

    // Federate 3 leaves instead of achieving; the barrier completes for
    // the survivors.
    federation.federate(3).resign().unwrap();
    federation.pump();
    for handle in [1, 2] {
        expect_callback(&federation.federate(handle), "FederationSynchronized", |callback| {
            matches!(callback, Callback::FederationSynchronized { label } if label == "exit")
        });
    }

    // A resigned federate can no longer issue service calls.
    assert_eq!(
        federation.federate(3).achieve_sync_point("exit"),
        Err(FederateError::NotJoined)
    );
}

#[test]
fn label_validation() {
    let federation = federation();
    assert_eq!(
        federation
            .federate(1)
            .register_sync_point("  ", Vec::new(), HashSet::new()),
        Err(FederateError::Sync(SyncError::IllegalLabel))
    );
    assert_eq!(
        federation.federate(1).achieve_sync_point("never-announced"),
        Err(FederateError::Sync(SyncError::LabelNotAnnounced {
            label: "never-announced".to_string(),
        }))
    );
}
