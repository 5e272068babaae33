//! # Fedsim Shared
//! Data model and claim-coordination state shared between fedsim federate
//! runtimes: handle types, message and callback records, the object
//! repository, and the ownership / synchronization-point / object-name
//! claim stores with their lowest-handle-wins tie-break rules.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod messages;
mod naming;
mod ownership;
mod sync;
mod types;
mod world;

pub use messages::{
    callback::Callback,
    message::{Envelope, Message, MessageKind},
};
pub use naming::{error::NamingError, table::NameTable};
pub use ownership::{
    error::OwnershipError,
    store::{AcquisitionClaim, ClaimKind, OwnershipStore},
};
pub use sync::{
    error::SyncError,
    store::{SyncPoint, SyncPointStore, SyncStatus},
};
pub use types::{
    AttributeHandle, ClassHandle, FederateHandle, ObjectHandle, Ownership, PRIVILEGE_TO_DELETE,
};
pub use world::{
    error::WorldError,
    interests::InterestTable,
    repository::{AttributeInstance, ObjectInstance, Repository},
};
