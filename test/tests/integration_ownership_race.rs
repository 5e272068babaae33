//! Two federates race an if-available acquisition of the same unowned
//! attribute through overlapping claim windows. Both intents are delivered
//! while both claimants are still inside their windows; the lower federate
//! handle must win on every member and the loser must hear about it as a
//! callback, not an error.

use std::collections::HashSet;
use std::sync::Barrier;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fedsim_shared::{Callback, Ownership};
use fedsim_test::{expect_callback, TestFederation};

const CLASS: u16 = 7;
const ATTRIBUTE: u16 = 5;

#[test]
fn lower_handle_wins_concurrent_claim() {
    let _ = env_logger::builder().is_test(true).try_init();

    let federation = TestFederation::new(&[1, 2, 3], Duration::from_millis(200));
    let attributes: HashSet<u16> = [ATTRIBUTE].into();
    for handle in [1, 2, 3] {
        federation
            .federate(handle)
            .publish_object_class(CLASS, attributes.clone());
    }

    // Federate 3 registers the object and drops the attribute so it is
    // unowned everywhere before the race starts.
    let registrant = federation.federate(3);
    let object = registrant.register_object(CLASS, None).unwrap();
    federation.pump();
    registrant
        .unconditional_divest_attributes(object, attributes.clone())
        .unwrap();
    federation.pump();
    for handle in [1, 2, 3] {
        assert_eq!(
            federation
                .federate(handle)
                .attribute_owner(object, ATTRIBUTE)
                .unwrap(),
            Ownership::Unowned
        );
    }

    // Hold the router so neither intent lands before both claimants are
    // inside their wait windows, then deliver both at once.
    federation.router().hold();
    let barrier = Arc::new(Barrier::new(2));
    let threads: Vec<_> = [1, 2]
        .into_iter()
        .map(|handle| {
            let federate = federation.federate(handle);
            let barrier = barrier.clone();
            let attributes = attributes.clone();
            thread::spawn(move || {
                barrier.wait();
                federate
                    .acquire_attributes_if_available(object, attributes)
                    .unwrap();
            })
        })
        .collect();
    thread::sleep(Duration::from_millis(50));
    federation.router().release();
    federation.pump();
    for thread in threads {
        thread.join().unwrap();
    }
    federation.pump();

    // Every member converges on federate 1 as the owner.
    for handle in [1, 2, 3] {
        assert_eq!(
            federation
                .federate(handle)
                .attribute_owner(object, ATTRIBUTE)
                .unwrap(),
            Ownership::OwnedBy(1),
            "federate [{handle}] disagrees on the owner"
        );
    }

    expect_callback(
        &federation.federate(1),
        "OwnershipAcquired",
        |callback| {
            matches!(
                callback,
                Callback::OwnershipAcquired { object: won, attributes, if_available: true }
                    if *won == object && attributes.contains(&ATTRIBUTE)
            )
        },
    );
    let losses = expect_callback(
        &federation.federate(2),
        "AttributesUnavailable",
        |callback| {
            matches!(
                callback,
                Callback::AttributesUnavailable { object: lost, attributes }
                    if *lost == object && attributes.contains(&ATTRIBUTE)
            )
        },
    );
    assert!(
        !losses
            .iter()
            .any(|callback| matches!(callback, Callback::OwnershipAcquired { .. })),
        "the losing federate must not also be granted ownership"
    );
}

#[test]
fn uncontended_claim_is_granted() {
    let _ = env_logger::builder().is_test(true).try_init();

    let federation = TestFederation::new(&[1, 2], Duration::ZERO);
    let attributes: HashSet<u16> = [ATTRIBUTE].into();
    for handle in [1, 2] {
        federation
            .federate(handle)
            .publish_object_class(CLASS, attributes.clone());
    }

    let registrant = federation.federate(1);
    let object = registrant.register_object(CLASS, None).unwrap();
    federation.pump();
    registrant
        .unconditional_divest_attributes(object, attributes.clone())
        .unwrap();
    federation.pump();

    federation
        .federate(2)
        .acquire_attributes_if_available(object, attributes)
        .unwrap();
    federation.pump();

    for handle in [1, 2] {
        assert_eq!(
            federation
                .federate(handle)
                .attribute_owner(object, ATTRIBUTE)
                .unwrap(),
            Ownership::OwnedBy(2)
        );
    }
}
