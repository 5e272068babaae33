use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use log::error;

use fedsim_shared::{
    AttributeHandle, Callback, ClassHandle, Envelope, FederateHandle, Message, ObjectHandle,
    Ownership,
};

use crate::connection::Connection;
use crate::error::FederateError;
use crate::handlers;
use crate::pipeline::{Flow, MessageContext, Pipeline};
use crate::state::LocalState;

/// One federate's view of the federation: its local state under a single
/// coarse lock, the handler pipeline, and the connection it broadcasts on.
///
/// Service calls run the outgoing chains on the caller's thread; the
/// connection's delivery thread feeds peer messages through [`receive`].
/// Race losses never surface as errors here; they arrive as callbacks from
/// [`drain_callbacks`].
///
/// [`receive`]: Federate::receive
/// [`drain_callbacks`]: Federate::drain_callbacks
pub struct Federate<C: Connection> {
    handle: FederateHandle,
    state: Mutex<LocalState>,
    pipeline: Pipeline,
    connection: C,
}

impl<C: Connection> Federate<C> {
    pub fn new(handle: FederateHandle, connection: C) -> Self {
        Federate {
            handle,
            state: Mutex::new(LocalState::new(handle)),
            pipeline: Pipeline::new(),
            connection,
        }
    }

    pub fn handle(&self) -> FederateHandle {
        self.handle
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    fn lock(&self) -> MutexGuard<LocalState> {
        self.state.lock().expect("federate state lock poisoned")
    }

    /// Runs one outgoing message through the pipeline. When a handler defers
    /// to the claim window the lock is dropped for the duration of the
    /// broadcast-and-wait, then re-taken for the finalize step.
    fn execute(&self, message: Message) -> Result<Option<ObjectHandle>, FederateError> {
        let (flow, registered) = {
            let mut state = self.lock();
            let mut ctx =
                MessageContext::new(&mut state, &self.connection, &self.pipeline, self.handle);
            let flow = self.pipeline.run_outgoing(&mut ctx, &message)?;
            (flow, ctx.registered_object)
        };
        match flow {
            Flow::Handled => Ok(registered),
            Flow::Continue => {
                self.connection
                    .broadcast(Envelope::new(self.handle, message));
                Ok(registered)
            }
            Flow::Await(claim) => {
                let intent = claim.intent();
                self.connection
                    .broadcast_and_sleep(Envelope::new(self.handle, intent));
                let mut state = self.lock();
                let mut ctx =
                    MessageContext::new(&mut state, &self.connection, &self.pipeline, self.handle);
                handlers::finalize(&mut ctx, claim)?;
                Ok(registered)
            }
        }
    }

    /// Feeds one peer message through the incoming chains. Failures are
    /// logged, never propagated: there is no caller to hand them to.
    pub fn receive(&self, envelope: Envelope) {
        if envelope.source == self.handle {
            return;
        }
        let mut state = self.lock();
        let mut ctx =
            MessageContext::new(&mut state, &self.connection, &self.pipeline, envelope.source);
        if let Err(failure) = self.pipeline.run_incoming(&mut ctx, &envelope.message) {
            error!(
                "[{}] incoming {:?} from federate [{}] failed: {failure}",
                self.handle,
                envelope.message.kind(),
                envelope.source
            );
        }
    }

    /// Drains the queued application callbacks, oldest first.
    pub fn drain_callbacks(&self) -> Vec<Callback> {
        self.lock().callbacks.drain(..).collect()
    }

    /// Records a peer as part of the federation roster.
    pub fn federate_joined(&self, federate: FederateHandle) {
        self.lock().roster.insert(federate);
    }

    pub fn is_joined(&self) -> bool {
        self.lock().joined
    }

    // ---- declaration ----------------------------------------------------

    pub fn publish_object_class(&self, class: ClassHandle, attributes: HashSet<AttributeHandle>) {
        self.lock().interests.publish_object_class(class, attributes);
    }

    pub fn unpublish_object_class(&self, class: ClassHandle) {
        self.lock().interests.unpublish_object_class(class);
    }

    // ---- object lifecycle -------------------------------------------------

    /// Registers a new object instance, optionally binding a name, and
    /// announces it to the federation.
    pub fn register_object(
        &self,
        class: ClassHandle,
        name: Option<String>,
    ) -> Result<ObjectHandle, FederateError> {
        let registered = self.execute(Message::RegisterObject { class, name })?;
        Ok(registered.expect("object registration completed without a handle"))
    }

    pub fn delete_object(&self, object: ObjectHandle) -> Result<(), FederateError> {
        self.execute(Message::DeleteObject { object }).map(|_| ())
    }

    /// Current owner of an attribute, as this federate sees it.
    pub fn attribute_owner(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<Ownership, FederateError> {
        Ok(self.lock().repository.attribute_owner(object, attribute)?)
    }

    // ---- ownership --------------------------------------------------------

    /// Requests ownership of the attributes: unowned ones are raced through
    /// the claim window, owned ones are requested from their owners.
    pub fn acquire_attributes(
        &self,
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::AttributeAcquire {
            object,
            attributes,
            if_available: false,
        })
        .map(|_| ())
    }

    /// Like [`acquire_attributes`], but only takes what is currently
    /// unowned; nothing is ever requested from an owner.
    ///
    /// [`acquire_attributes`]: Federate::acquire_attributes
    pub fn acquire_attributes_if_available(
        &self,
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::AttributeAcquire {
            object,
            attributes,
            if_available: true,
        })
        .map(|_| ())
    }

    /// Drops ownership immediately. Attributes under acquisition are handed
    /// to their claimant; the rest become unowned.
    pub fn unconditional_divest_attributes(
        &self,
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::AttributeDivest {
            object,
            attributes,
            unconditional: true,
        })
        .map(|_| ())
    }

    /// Offers ownership up without dropping it; the transfer happens when
    /// somebody asks for the attributes.
    pub fn negotiated_divest_attributes(
        &self,
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::AttributeDivest {
            object,
            attributes,
            unconditional: false,
        })
        .map(|_| ())
    }

    /// Hands the attributes to whoever holds the winning claim for them.
    /// The usual answer to a [`Callback::ReleaseRequested`].
    pub fn release_attributes(
        &self,
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::AttributeRelease { object, attributes })
            .map(|_| ())
    }

    /// Withdraws an outstanding acquisition request. A grant already in
    /// flight wins over the cancel.
    pub fn cancel_acquisition(
        &self,
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::CancelAcquire { object, attributes })
            .map(|_| ())
    }

    /// Withdraws a standing negotiated-divest offer.
    pub fn cancel_divest(
        &self,
        object: ObjectHandle,
        attributes: HashSet<AttributeHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::CancelDivest { object, attributes })
            .map(|_| ())
    }

    /// Answers with a [`Callback::OwnershipInfo`] from local state.
    pub fn query_attribute_ownership(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<(), FederateError> {
        self.execute(Message::QueryOwnership { object, attribute })
            .map(|_| ())
    }

    // ---- synchronization ----------------------------------------------------

    /// Registers a synchronization point. An empty scope means the whole
    /// federation, present and future members included. The result arrives
    /// as a registration callback.
    pub fn register_sync_point(
        &self,
        label: &str,
        tag: Vec<u8>,
        scope: HashSet<FederateHandle>,
    ) -> Result<(), FederateError> {
        self.execute(Message::RegisterSyncPoint {
            label: label.to_string(),
            tag,
            scope,
        })
        .map(|_| ())
    }

    pub fn achieve_sync_point(&self, label: &str) -> Result<(), FederateError> {
        self.execute(Message::SyncPointAchieved {
            label: label.to_string(),
        })
        .map(|_| ())
    }

    // ---- naming -------------------------------------------------------------

    /// Races a name reservation through the claim window. The outcome
    /// arrives as a reservation callback; only an illegal name fails here.
    pub fn reserve_object_name(&self, name: &str) -> Result<(), FederateError> {
        self.execute(Message::ReserveObjectName {
            name: name.to_string(),
        })
        .map(|_| ())
    }

    pub fn release_object_name(&self, name: &str) -> Result<(), FederateError> {
        self.execute(Message::ReleaseObjectName {
            name: name.to_string(),
        })
        .map(|_| ())
    }

    // ---- lifecycle ------------------------------------------------------------

    /// Leaves the federation. Further service calls fail with
    /// [`FederateError::NotJoined`].
    pub fn resign(&self) -> Result<(), FederateError> {
        self.execute(Message::ResignFederation).map(|_| ())
    }
}
