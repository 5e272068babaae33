use std::collections::HashSet;

use crate::types::{AttributeHandle, ClassHandle, ObjectHandle, Ownership};

/// Notifications queued for the local federate's application callback
/// surface. Race losses travel through these as plain outcomes; they are
/// never surfaced as errors.
#[derive(Clone, Debug, PartialEq)]
pub enum Callback {
    /// The local federate now owns the attributes.
    OwnershipAcquired {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
        if_available: bool,
    },
    /// The attributes could not be acquired: owned elsewhere, already
    /// claimed, or lost to a lower-handle claim.
    AttributesUnavailable {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    /// Another federate wants attributes the local federate owns; the
    /// application decides whether to release them.
    ReleaseRequested {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    /// Another federate has offered these attributes through a negotiated
    /// divest; the local federate may acquire them.
    OwnershipAssumptionRequested {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    /// A negotiated divest completed: somebody took the attributes.
    DivestConfirmed {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    /// A cancel-acquisition request took effect for these attributes.
    AcquisitionCancelled {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    /// A cancel-divest request took effect for these attributes.
    DivestCancelled {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    OwnershipInfo {
        object: ObjectHandle,
        attribute: AttributeHandle,
        owner: Ownership,
    },
    SyncRegistrationSucceeded { label: String },
    SyncRegistrationFailed { label: String, reason: String },
    SyncPointAnnounced { label: String, tag: Vec<u8> },
    /// Every federate in scope has achieved the point; the label is retired.
    FederationSynchronized { label: String },
    NameReservationSucceeded { name: String },
    NameReservationFailed { name: String },
    ObjectDiscovered {
        object: ObjectHandle,
        class: ClassHandle,
        name: Option<String>,
    },
    ObjectDeleted { object: ObjectHandle },
}
