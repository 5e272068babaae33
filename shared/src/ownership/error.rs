use thiserror::Error;

use crate::types::{AttributeHandle, FederateHandle, ObjectHandle};

/// Ownership-state validation failures. All of these are detected against
/// local state before any message leaves the federate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("attribute [{attribute}] of object [{object}] is not owned by the local federate (owner: {owner:?})")]
    AttributeNotOwned {
        object: ObjectHandle,
        attribute: AttributeHandle,
        owner: Option<FederateHandle>,
    },

    /// Raised when acquiring something the caller already owns.
    #[error("local federate already owns attribute [{attribute}] of object [{object}]")]
    FederateOwnsAttributes {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    /// Raised when cancelling an acquisition of something the caller owns.
    #[error("attribute [{attribute}] of object [{object}] is already owned by the local federate")]
    AttributeAlreadyOwned {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    #[error("attribute [{attribute}] of object [{object}] is already being divested")]
    AttributeAlreadyBeingDivested {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    #[error("no outstanding divestiture for attribute [{attribute}] of object [{object}]")]
    AttributeDivestitureWasNotRequested {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    #[error("no outstanding acquisition for attribute [{attribute}] of object [{object}]")]
    AttributeAcquisitionWasNotRequested {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    #[error("attribute [{attribute}] of object [{object}] is not under a release request")]
    FederateWasNotAskedToReleaseAttribute {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },
}
