//! Object instance lifecycle: registration and discovery with the full
//! owner map, delete-privilege enforcement and transfer, and the implicit
//! divest of a resigned federate's attributes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use fedsim_federate::{Federate, FederateError};
use fedsim_shared::{Callback, Ownership, WorldError, PRIVILEGE_TO_DELETE};
use fedsim_test::{expect_callback, LoopConnection, TestFederation};

const CLASS: u16 = 7;
const ATTRIBUTE: u16 = 5;

fn setup() -> (TestFederation, Arc<Federate<LoopConnection>>, Arc<Federate<LoopConnection>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let federation = TestFederation::new(&[1, 2], Duration::ZERO);
    for handle in [1, 2] {
        federation
            .federate(handle)
            .publish_object_class(CLASS, HashSet::from([PRIVILEGE_TO_DELETE, ATTRIBUTE]));
    }
    let first = federation.federate(1);
    let second = federation.federate(2);
    (federation, first, second)
}

#[test]
fn discovery_carries_the_owner_map() {
    let (federation, first, second) = setup();

    let object = first.register_object(CLASS, None).unwrap();
    federation.pump();
    expect_callback(&second, "ObjectDiscovered", |callback| {
        matches!(
            callback,
            Callback::ObjectDiscovered { object: found, class: CLASS, name: None }
                if *found == object
        )
    });

    // The discoverer sees the registrant owning every published attribute
    // and the delete privilege.
    for attribute in [PRIVILEGE_TO_DELETE, ATTRIBUTE] {
        assert_eq!(
            second.attribute_owner(object, attribute).unwrap(),
            Ownership::OwnedBy(1)
        );
    }
}

#[test]
fn registering_an_unpublished_class_is_an_error() {
    let (_federation, first, _second) = setup();
    assert_eq!(
        first.register_object(99, None),
        Err(FederateError::World(WorldError::ObjectClassNotPublished {
            class: 99,
        }))
    );
}

#[test]
fn deletion_requires_the_privilege() {
    let (federation, first, second) = setup();

    let object = first.register_object(CLASS, None).unwrap();
    federation.pump();

    assert_eq!(
        second.delete_object(object),
        Err(FederateError::World(WorldError::DeletePrivilegeNotHeld {
            object,
        }))
    );

    first.delete_object(object).unwrap();
    federation.pump();
    expect_callback(&second, "ObjectDeleted", |callback| {
        matches!(callback, Callback::ObjectDeleted { object: gone } if *gone == object)
    });
    assert_eq!(
        second.attribute_owner(object, ATTRIBUTE),
        Err(FederateError::World(WorldError::ObjectNotKnown { object }))
    );
}

#[test]
fn delete_privilege_transfers_like_any_attribute() {
    let (federation, first, second) = setup();

    let object = first.register_object(CLASS, None).unwrap();
    federation.pump();

    second
        .acquire_attributes(object, HashSet::from([PRIVILEGE_TO_DELETE]))
        .unwrap();
    federation.pump();
    first
        .release_attributes(object, HashSet::from([PRIVILEGE_TO_DELETE]))
        .unwrap();
    federation.pump();

    assert_eq!(
        first.delete_object(object),
        Err(FederateError::World(WorldError::DeletePrivilegeNotHeld {
            object,
        }))
    );
    second.delete_object(object).unwrap();
    federation.pump();
    assert_eq!(
        first.attribute_owner(object, ATTRIBUTE),
        Err(FederateError::World(WorldError::ObjectNotKnown { object }))
    );
}

#[test]
fn resignation_orphans_the_resignees_attributes() {
    let (federation, first, second) = setup();

    let object = first.register_object(CLASS, None).unwrap();
    federation.pump();
    second
        .acquire_attributes(object, HashSet::from([ATTRIBUTE]))
        .unwrap();
    federation.pump();
    first
        .release_attributes(object, HashSet::from([ATTRIBUTE]))
        .unwrap();
    federation.pump();
    assert_eq!(
        first.attribute_owner(object, ATTRIBUTE).unwrap(),
        Ownership::OwnedBy(2)
    );

    second.resign().unwrap();
    federation.pump();

    // The departed federate's attribute is unowned; the rest untouched.
    assert_eq!(
        first.attribute_owner(object, ATTRIBUTE).unwrap(),
        Ownership::Unowned
    );
    assert_eq!(
        first.attribute_owner(object, PRIVILEGE_TO_DELETE).unwrap(),
        Ownership::OwnedBy(1)
    );
    assert_eq!(second.resign(), Err(FederateError::NotJoined));
}

#[test]
fn query_reports_the_local_view() {
    let (federation, first, second) = setup();
    let object = first.register_object(CLASS, None).unwrap();
    federation.pump();

    second.query_attribute_ownership(object, ATTRIBUTE).unwrap();
    expect_callback(&second, "OwnershipInfo", |callback| {
        matches!(
            callback,
            Callback::OwnershipInfo { object: queried, attribute: ATTRIBUTE, owner }
                if *queried == object && *owner == Ownership::OwnedBy(1)
        )
    });
}
