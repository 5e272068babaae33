use std::collections::HashSet;

use fedsim_shared::{
    AttributeHandle, Callback, Envelope, FederateHandle, Message, ObjectHandle,
};

use crate::connection::Connection;
use crate::pipeline::Pipeline;
use crate::state::LocalState;

/// Everything a handler needs while processing one message: the coarse-locked
/// federate state, the connection for broadcasts, and the handle of whichever
/// federate produced the message (the local one for outgoing traffic).
pub struct MessageContext<'a> {
    pub state: &'a mut LocalState,
    pub connection: &'a dyn Connection,
    pub pipeline: &'a Pipeline,
    pub source: FederateHandle,
    pub registered_object: Option<ObjectHandle>,
}

impl<'a> MessageContext<'a> {
    pub fn new(
        state: &'a mut LocalState,
        connection: &'a dyn Connection,
        pipeline: &'a Pipeline,
        source: FederateHandle,
    ) -> Self {
        MessageContext {
            state,
            connection,
            pipeline,
            source,
            registered_object: None,
        }
    }

    /// Handle of the federate this context belongs to.
    pub fn local(&self) -> FederateHandle {
        self.state.federate
    }

    pub fn broadcast(&self, message: Message) {
        self.connection
            .broadcast(Envelope::new(self.state.federate, message));
    }

    pub fn queue_callback(&mut self, callback: Callback) {
        self.state.queue_callback(callback);
    }
}

/// Outcome of a single handler in a chain.
pub enum Flow {
    /// The message was fully dealt with; stop the chain.
    Handled,
    /// Pass the message to the next handler (or the default broadcast).
    Continue,
    /// The handler recorded its intent and now needs the dispatcher to
    /// release the state lock, broadcast the intent, wait out the
    /// connection's claim window, and then run the matching finalize step.
    Await(PendingClaim),
}

/// A claim whose resolution is deferred until after the wait window.
///
/// The intent is broadcast with the state lock released, so a competing
/// claim from a peer can land in between and is settled by handle order
/// when the finalize step re-reads the local record.
pub enum PendingClaim {
    AcquireIfAvailable {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
        unavailable: HashSet<AttributeHandle>,
    },
    CancelAcquisition {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    CancelDivest {
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    },
    SyncRegistration {
        label: String,
        tag: Vec<u8>,
        scope: HashSet<FederateHandle>,
    },
    NameReservation {
        name: String,
    },
}

impl PendingClaim {
    /// The message peers must see before the wait window closes.
    pub fn intent(&self) -> Message {
        match self {
            PendingClaim::AcquireIfAvailable {
                object, attributes, ..
            } => Message::AttributeAcquire {
                object: *object,
                attributes: attributes.clone(),
                if_available: true,
            },
            PendingClaim::CancelAcquisition { object, attributes } => Message::CancelAcquire {
                object: *object,
                attributes: attributes.clone(),
            },
            PendingClaim::CancelDivest { object, attributes } => Message::CancelDivest {
                object: *object,
                attributes: attributes.clone(),
            },
            PendingClaim::SyncRegistration { label, .. } => Message::SyncRegistrationRequest {
                label: label.clone(),
            },
            PendingClaim::NameReservation { name } => Message::ReserveObjectName {
                name: name.clone(),
            },
        }
    }
}
