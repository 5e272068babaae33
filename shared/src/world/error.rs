use thiserror::Error;

use crate::types::{AttributeHandle, ClassHandle, ObjectHandle};

/// Failures of the local-state checks run against the object repository and
/// publication interests. These are detected before any broadcast happens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorldError {
    /// The object has not been registered or discovered locally.
    #[error("object [{object}] is unknown (or undiscovered)")]
    ObjectNotKnown { object: ObjectHandle },

    /// The attribute is not defined on the object's discovered class.
    #[error("attribute [{attribute}] is not defined on object [{object}]")]
    AttributeNotDefined {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    #[error("object class [{class}] is not published by the local federate")]
    ObjectClassNotPublished { class: ClassHandle },

    #[error("attribute [{attribute}] of class [{class}] is not published by the local federate")]
    AttributeNotPublished {
        class: ClassHandle,
        attribute: AttributeHandle,
    },

    /// The name is reserved by another federate or bound to a live object.
    #[error("object name [{name}] is already in use")]
    NameAlreadyInUse { name: String },

    /// Deleting an object requires ownership of its privilege attribute.
    #[error("local federate does not hold the delete privilege for object [{object}]")]
    DeletePrivilegeNotHeld { object: ObjectHandle },
}
