use std::collections::{HashMap, HashSet};

use crate::types::{AttributeHandle, ClassHandle, FederateHandle, ObjectHandle, Ownership};

/// A federation message together with the federate that produced it.
///
/// The wire encoding of the envelope is the transport's concern; the
/// coordination core only ever sees it in this decoded form.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub source: FederateHandle,
    pub message: Message,
}

impl Envelope {
    pub fn new(source: FederateHandle, message: Message) -> Self {
        Self { source, message }
    }
}

/// The message kinds exchanged between federates, as plain data records.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Request ownership of attributes, either directly from their current
    /// owner or only if they are currently unowned.
    AttributeAcquire {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
        if_available: bool,
    },
    /// Give up ownership, immediately or as a standing offer.
    AttributeDivest {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
        unconditional: bool,
    },
    /// The current owner hands the attributes to whoever holds the winning
    /// acquisition claim for them.
    AttributeRelease {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    /// Commit notice: the sender now owns the attributes. Broadcast so every
    /// federate converges on the same owner.
    OwnershipAcquired {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
        if_available: bool,
    },
    CancelAcquire {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    CancelDivest {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    QueryOwnership {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },
    /// Intent to register a synchronization point label.
    SyncRegistrationRequest { label: String },
    /// Announce of a won synchronization point registration. Also the
    /// outgoing request record for the local registration call.
    RegisterSyncPoint {
        label: String,
        tag: Vec<u8>,
        scope: HashSet<FederateHandle>,
    },
    SyncPointAchieved { label: String },
    /// Intent to reserve an object name.
    ReserveObjectName { name: String },
    ReleaseObjectName { name: String },
    /// Local-only request record; never broadcast. The federation learns of
    /// the new instance through `DiscoverObject`.
    RegisterObject {
        class: ClassHandle,
        name: Option<String>,
    },
    DiscoverObject {
        object: ObjectHandle,
        class: ClassHandle,
        name: Option<String>,
        owners: HashMap<AttributeHandle, Ownership>,
    },
    DeleteObject { object: ObjectHandle },
    ResignFederation,
}

/// Discriminant used to key handler chains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    AttributeAcquire,
    AttributeDivest,
    AttributeRelease,
    OwnershipAcquired,
    CancelAcquire,
    CancelDivest,
    QueryOwnership,
    SyncRegistrationRequest,
    RegisterSyncPoint,
    SyncPointAchieved,
    ReserveObjectName,
    ReleaseObjectName,
    RegisterObject,
    DiscoverObject,
    DeleteObject,
    ResignFederation,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::AttributeAcquire { .. } => MessageKind::AttributeAcquire,
            Message::AttributeDivest { .. } => MessageKind::AttributeDivest,
            Message::AttributeRelease { .. } => MessageKind::AttributeRelease,
            Message::OwnershipAcquired { .. } => MessageKind::OwnershipAcquired,
            Message::CancelAcquire { .. } => MessageKind::CancelAcquire,
            Message::CancelDivest { .. } => MessageKind::CancelDivest,
            Message::QueryOwnership { .. } => MessageKind::QueryOwnership,
            Message::SyncRegistrationRequest { .. } => MessageKind::SyncRegistrationRequest,
            Message::RegisterSyncPoint { .. } => MessageKind::RegisterSyncPoint,
            Message::SyncPointAchieved { .. } => MessageKind::SyncPointAchieved,
            Message::ReserveObjectName { .. } => MessageKind::ReserveObjectName,
            Message::ReleaseObjectName { .. } => MessageKind::ReleaseObjectName,
            Message::RegisterObject { .. } => MessageKind::RegisterObject,
            Message::DiscoverObject { .. } => MessageKind::DiscoverObject,
            Message::DeleteObject { .. } => MessageKind::DeleteObject,
            Message::ResignFederation => MessageKind::ResignFederation,
        }
    }
}
