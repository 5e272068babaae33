//! Divestiture and release flows between two federates: negotiated divest
//! answered by an acquisition, explicit release after a release request,
//! unconditional divest handing claimed attributes straight over, and the
//! two cancel services.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use fedsim_federate::{Federate, FederateError};
use fedsim_shared::{Callback, Ownership, OwnershipError};
use fedsim_test::{expect_callback, LoopConnection, TestFederation};

const CLASS: u16 = 7;
const ATTRIBUTE: u16 = 5;

fn two_federates() -> (TestFederation, Arc<Federate<LoopConnection>>, Arc<Federate<LoopConnection>>, u32) {
    let _ = env_logger::builder().is_test(true).try_init();
    let federation = TestFederation::new(&[1, 2], Duration::ZERO);
    let attributes: HashSet<u16> = [ATTRIBUTE].into();
    for handle in [1, 2] {
        federation
            .federate(handle)
            .publish_object_class(CLASS, attributes.clone());
    }
    let owner = federation.federate(1);
    let other = federation.federate(2);
    let object = owner.register_object(CLASS, None).unwrap();
    federation.pump();
    (federation, owner, other, object)
}

fn attributes() -> HashSet<u16> {
    [ATTRIBUTE].into()
}

#[test]
fn negotiated_divest_completes_through_acquisition() {
    let (federation, owner, other, object) = two_federates();

    owner
        .negotiated_divest_attributes(object, attributes())
        .unwrap();
    federation.pump();
    expect_callback(&other, "OwnershipAssumptionRequested", |callback| {
        matches!(
            callback,
            Callback::OwnershipAssumptionRequested { object: offered, attributes }
                if *offered == object && attributes.contains(&ATTRIBUTE)
        )
    });

    // The direct acquisition meets the standing offer; the owner releases
    // without consulting its application.
    other.acquire_attributes(object, attributes()).unwrap();
    federation.pump();

    for federate in [&owner, &other] {
        assert_eq!(
            federate.attribute_owner(object, ATTRIBUTE).unwrap(),
            Ownership::OwnedBy(2)
        );
    }
    expect_callback(&owner, "DivestConfirmed", |callback| {
        matches!(
            callback,
            Callback::DivestConfirmed { object: divested, attributes }
                if *divested == object && attributes.contains(&ATTRIBUTE)
        )
    });
    expect_callback(&other, "OwnershipAcquired", |callback| {
        matches!(
            callback,
            Callback::OwnershipAcquired { object: won, if_available: false, attributes }
                if *won == object && attributes.contains(&ATTRIBUTE)
        )
    });
}

#[test]
fn double_negotiated_divest_is_an_error() {
    let (_federation, owner, _other, object) = two_federates();
    owner
        .negotiated_divest_attributes(object, attributes())
        .unwrap();
    assert_eq!(
        owner.negotiated_divest_attributes(object, attributes()),
        Err(FederateError::Ownership(
            OwnershipError::AttributeAlreadyBeingDivested {
                object,
                attribute: ATTRIBUTE,
            }
        ))
    );
}

#[test]
fn release_request_answered_by_release() {
    let (federation, owner, other, object) = two_federates();

    other.acquire_attributes(object, attributes()).unwrap();
    federation.pump();
    expect_callback(&owner, "ReleaseRequested", |callback| {
        matches!(
            callback,
            Callback::ReleaseRequested { object: wanted, attributes }
                if *wanted == object && attributes.contains(&ATTRIBUTE)
        )
    });

    owner.release_attributes(object, attributes()).unwrap();
    federation.pump();

    for federate in [&owner, &other] {
        assert_eq!(
            federate.attribute_owner(object, ATTRIBUTE).unwrap(),
            Ownership::OwnedBy(2)
        );
    }
    expect_callback(&other, "OwnershipAcquired", |callback| {
        matches!(callback, Callback::OwnershipAcquired { if_available: false, .. })
    });
}

#[test]
fn release_without_request_is_an_error() {
    let (_federation, owner, _other, object) = two_federates();
    assert_eq!(
        owner.release_attributes(object, attributes()),
        Err(FederateError::Ownership(
            OwnershipError::FederateWasNotAskedToReleaseAttribute {
                object,
                attribute: ATTRIBUTE,
            }
        ))
    );
}

#[test]
fn unconditional_divest_hands_claimed_attributes_over() {
    let (federation, owner, other, object) = two_federates();

    other.acquire_attributes(object, attributes()).unwrap();
    federation.pump();
    owner.drain_callbacks();

    // The claimed attribute goes straight to its claimant; it is never
    // observed as unowned on either side.
    owner
        .unconditional_divest_attributes(object, attributes())
        .unwrap();
    assert_eq!(
        owner.attribute_owner(object, ATTRIBUTE).unwrap(),
        Ownership::OwnedBy(2)
    );
    federation.pump();
    assert_eq!(
        other.attribute_owner(object, ATTRIBUTE).unwrap(),
        Ownership::OwnedBy(2)
    );
    expect_callback(&other, "OwnershipAcquired", |callback| {
        matches!(callback, Callback::OwnershipAcquired { .. })
    });
}

#[test]
fn unconditional_divest_without_claim_leaves_attributes_unowned() {
    let (federation, owner, other, object) = two_federates();
    owner
        .unconditional_divest_attributes(object, attributes())
        .unwrap();
    federation.pump();
    for federate in [&owner, &other] {
        assert_eq!(
            federate.attribute_owner(object, ATTRIBUTE).unwrap(),
            Ownership::Unowned
        );
    }
}

#[test]
fn cancelled_acquisition_withdraws_the_claim() {
    let (federation, owner, other, object) = two_federates();

    other.acquire_attributes(object, attributes()).unwrap();
    federation.pump();
    owner.drain_callbacks();

    other.cancel_acquisition(object, attributes()).unwrap();
    federation.pump();
    expect_callback(&other, "AcquisitionCancelled", |callback| {
        matches!(
            callback,
            Callback::AcquisitionCancelled { object: cancelled, attributes }
                if *cancelled == object && attributes.contains(&ATTRIBUTE)
        )
    });

    // The owner's record of the claim is gone too: a release now has
    // nobody to hand the attribute to.
    assert_eq!(
        owner.release_attributes(object, attributes()),
        Err(FederateError::Ownership(
            OwnershipError::FederateWasNotAskedToReleaseAttribute {
                object,
                attribute: ATTRIBUTE,
            }
        ))
    );
}

#[test]
fn cancel_after_grant_is_an_error() {
    let (federation, owner, other, object) = two_federates();

    other.acquire_attributes(object, attributes()).unwrap();
    federation.pump();
    owner.release_attributes(object, attributes()).unwrap();
    federation.pump();
    assert_eq!(
        other.attribute_owner(object, ATTRIBUTE).unwrap(),
        Ownership::OwnedBy(2)
    );

    // The grant was already in flight; cancelling something you now own
    // fails synchronously.
    assert_eq!(
        other.cancel_acquisition(object, attributes()),
        Err(FederateError::Ownership(OwnershipError::AttributeAlreadyOwned {
            object,
            attribute: ATTRIBUTE,
        }))
    );
}

#[test]
fn cancelled_divest_withdraws_the_offer() {
    let (federation, owner, other, object) = two_federates();

    owner
        .negotiated_divest_attributes(object, attributes())
        .unwrap();
    federation.pump();
    other.drain_callbacks();

    owner.cancel_divest(object, attributes()).unwrap();
    federation.pump();
    expect_callback(&owner, "DivestCancelled", |callback| {
        matches!(
            callback,
            Callback::DivestCancelled { object: kept, attributes }
                if *kept == object && attributes.contains(&ATTRIBUTE)
        )
    });

    // With the offer gone, an acquisition goes back through the owner's
    // application instead of auto-releasing.
    other.acquire_attributes(object, attributes()).unwrap();
    federation.pump();
    expect_callback(&owner, "ReleaseRequested", |callback| {
        matches!(callback, Callback::ReleaseRequested { .. })
    });
    assert_eq!(
        owner.attribute_owner(object, ATTRIBUTE).unwrap(),
        Ownership::OwnedBy(1)
    );
}

#[test]
fn cancel_divest_without_offer_is_an_error() {
    let (_federation, owner, _other, object) = two_federates();
    assert_eq!(
        owner.cancel_divest(object, attributes()),
        Err(FederateError::Ownership(
            OwnershipError::AttributeDivestitureWasNotRequested {
                object,
                attribute: ATTRIBUTE,
            }
        ))
    );
}
