//! # Fedsim Federate
//! The federate-side coordination core: decentralized attribute ownership
//! transfer, synchronization points, object naming and instance lifecycle,
//! all settled by broadcast claims and deterministic handle-order
//! tie-breaks instead of a central arbiter.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use fedsim_shared::{
        AttributeHandle, Callback, ClassHandle, Envelope, FederateHandle, Message, MessageKind,
        NamingError, ObjectHandle, Ownership, OwnershipError, SyncError, SyncStatus, WorldError,
        PRIVILEGE_TO_DELETE,
    };
}

mod connection;
mod error;
mod federate;
mod handlers;
mod pipeline;
mod state;

pub use connection::Connection;
pub use error::FederateError;
pub use federate::Federate;
