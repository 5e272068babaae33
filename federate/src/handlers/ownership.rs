//! Attribute ownership transfer: acquisition (direct and if-available),
//! negotiated and unconditional divestiture, release, and the two cancel
//! services.
//!
//! Acquisition of unowned attributes runs in two phases. Phase one records
//! the local claim and hands a pending claim back to the dispatcher, which
//! broadcasts the intent with the state lock released and waits out the
//! connection's claim window. Phase two re-reads the claim store: any
//! competing intent that arrived during the window has already been folded
//! in under the lowest-handle-wins rule, so whatever claims survive for the
//! local federate are the attributes it won.

use std::collections::HashSet;

use log::{debug, error, info, warn};

use fedsim_shared::{
    AttributeHandle, Callback, Message, ObjectHandle, Ownership, OwnershipError, WorldError,
};

use crate::error::FederateError;
use crate::handlers::reprocess_outgoing;
use crate::pipeline::{Flow, MessageContext, PendingClaim};
use crate::state::LocalState;

// ---- outgoing -----------------------------------------------------------

pub fn outgoing_acquire(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::AttributeAcquire {
        object,
        attributes,
        if_available,
    } = message
    else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    validate_acquire(ctx.state, object, attributes)?;
    if attributes.is_empty() {
        return Ok(Flow::Handled);
    }

    if *if_available {
        return begin_acquire_if_available(ctx, object, attributes.clone());
    }

    // Split the request: unowned and unclaimed attributes go through the
    // claim window, the rest are requested from their current owners.
    let (free, held) = split_by_availability(ctx.state, object, attributes);
    if !held.is_empty() {
        let local = ctx.local();
        ctx.state.ownership.request_acquisition(object, &held, local);
        debug!(
            "[{local}] requesting release of attributes {held:?} of object [{object}]"
        );
        ctx.broadcast(Message::AttributeAcquire {
            object,
            attributes: held,
            if_available: false,
        });
    }
    if !free.is_empty() {
        return begin_acquire_if_available(ctx, object, free);
    }
    Ok(Flow::Handled)
}

fn begin_acquire_if_available(
    ctx: &mut MessageContext,
    object: ObjectHandle,
    attributes: HashSet<AttributeHandle>,
) -> Result<Flow, FederateError> {
    let (available, unavailable) = split_by_availability(ctx.state, object, &attributes);
    if available.is_empty() {
        info!(
            "[{}] no attributes of {unavailable:?} on object [{object}] are available",
            ctx.local()
        );
        ctx.queue_callback(Callback::AttributesUnavailable {
            object,
            attributes: unavailable,
        });
        return Ok(Flow::Handled);
    }
    let local = ctx.local();
    ctx.state
        .ownership
        .request_acquisition_if_available(object, &available, local);
    Ok(Flow::Await(PendingClaim::AcquireIfAvailable {
        object,
        attributes: available,
        unavailable,
    }))
}

pub fn finalize_acquire_if_available(
    ctx: &mut MessageContext,
    object: ObjectHandle,
    attributes: HashSet<AttributeHandle>,
    unavailable: HashSet<AttributeHandle>,
) -> Result<(), FederateError> {
    let local = ctx.local();
    let obtained = ctx
        .state
        .ownership
        .complete_acquisition_if_available(object, local);
    if !obtained.is_empty() {
        for attribute in &obtained {
            ctx.state
                .repository
                .set_attribute_owner(object, *attribute, Ownership::OwnedBy(local));
        }
        info!("[{local}] took ownership of attributes {obtained:?} of object [{object}]");
        ctx.broadcast(Message::OwnershipAcquired {
            object,
            attributes: obtained.clone(),
            if_available: true,
        });
        ctx.queue_callback(Callback::OwnershipAcquired {
            object,
            attributes: obtained.clone(),
            if_available: true,
        });
    }

    let mut lost: HashSet<AttributeHandle> =
        attributes.difference(&obtained).copied().collect();
    lost.extend(unavailable);
    if !lost.is_empty() {
        debug!("[{local}] attributes {lost:?} of object [{object}] were unavailable");
        ctx.queue_callback(Callback::AttributesUnavailable {
            object,
            attributes: lost,
        });
    }
    Ok(())
}

pub fn outgoing_divest(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::AttributeDivest {
        object,
        attributes,
        unconditional,
    } = message
    else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let local = ctx.local();
    validate_owned(ctx.state, object, attributes)?;
    if !*unconditional {
        for attribute in attributes {
            if ctx.state.ownership.is_under_divest(object, *attribute) {
                return Err(OwnershipError::AttributeAlreadyBeingDivested {
                    object,
                    attribute: *attribute,
                }
                .into());
            }
        }
    }

    // Attributes somebody already has a direct claim on are handed over
    // right away through a synthesized release; they never pass through an
    // unowned state.
    let released = release_claimed(ctx, object, attributes);
    let remaining: HashSet<AttributeHandle> =
        attributes.difference(&released).copied().collect();
    if remaining.is_empty() {
        return Ok(Flow::Handled);
    }

    if *unconditional {
        for attribute in &remaining {
            ctx.state
                .repository
                .set_attribute_owner(object, *attribute, Ownership::Unowned);
        }
        info!("[{local}] unconditionally divested attributes {remaining:?} of object [{object}]");
        ctx.broadcast(Message::AttributeDivest {
            object,
            attributes: remaining,
            unconditional: true,
        });
    } else {
        ctx.state
            .ownership
            .request_divestiture(object, &remaining, local);
        info!("[{local}] offered attributes {remaining:?} of object [{object}] for divestiture");
        ctx.broadcast(Message::AttributeDivest {
            object,
            attributes: remaining,
            unconditional: false,
        });
    }
    Ok(Flow::Handled)
}

/// Releases whichever of `attributes` are under a direct acquisition claim,
/// returning the set that was handed over.
fn release_claimed(
    ctx: &mut MessageContext,
    object: ObjectHandle,
    attributes: &HashSet<AttributeHandle>,
) -> HashSet<AttributeHandle> {
    let claimed = ctx.state.ownership.direct_claims(object, attributes);
    if claimed.is_empty() {
        return HashSet::new();
    }
    let set: HashSet<AttributeHandle> = claimed.keys().copied().collect();
    debug!(
        "[{}] attributes {set:?} of object [{object}] are under acquisition, releasing them",
        ctx.local()
    );
    let release = Message::AttributeRelease {
        object,
        attributes: set.clone(),
    };
    if let Err(failure) = reprocess_outgoing(ctx, &release) {
        error!(
            "[{}] failed to release attributes {set:?} of object [{object}]: {failure}",
            ctx.local()
        );
    }
    set
}

pub fn outgoing_release(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::AttributeRelease { object, attributes } = message else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let local = ctx.local();
    validate_owned(ctx.state, object, attributes)?;
    let claimed = ctx.state.ownership.direct_claims(object, attributes);
    for attribute in attributes {
        if !claimed.contains_key(attribute) {
            return Err(OwnershipError::FederateWasNotAskedToReleaseAttribute {
                object,
                attribute: *attribute,
            }
            .into());
        }
    }

    let released = ctx.state.ownership.release_attributes(object, attributes);
    for (attribute, claimant) in &released {
        ctx.state
            .repository
            .set_attribute_owner(object, *attribute, Ownership::OwnedBy(*claimant));
    }
    info!(
        "[{local}] released attributes {:?} of object [{object}]",
        released.keys().collect::<Vec<_>>()
    );

    // A release of attributes under a standing divest offer confirms the
    // divestiture.
    let divested = ctx.state.ownership.complete_divest(object, attributes);
    if !divested.is_empty() {
        ctx.queue_callback(Callback::DivestConfirmed {
            object,
            attributes: divested,
        });
    }

    ctx.broadcast(Message::AttributeRelease {
        object,
        attributes: attributes.clone(),
    });
    Ok(Flow::Handled)
}

pub fn outgoing_cancel_acquire(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::CancelAcquire { object, attributes } = message else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let local = ctx.local();
    let instance = ctx.state.repository.checked_instance(object)?;
    for attribute in attributes {
        let record = instance
            .attribute(*attribute)
            .ok_or(WorldError::AttributeNotDefined {
                object,
                attribute: *attribute,
            })?;
        if record.is_owned_by(local) {
            return Err(OwnershipError::AttributeAlreadyOwned {
                object,
                attribute: *attribute,
            }
            .into());
        }
    }
    let claimed = ctx.state.ownership.claims_by(object, attributes, local);
    for attribute in attributes {
        if !claimed.contains(attribute) {
            return Err(OwnershipError::AttributeAcquisitionWasNotRequested {
                object,
                attribute: *attribute,
            }
            .into());
        }
    }
    Ok(Flow::Await(PendingClaim::CancelAcquisition {
        object,
        attributes: attributes.clone(),
    }))
}

pub fn finalize_cancel_acquisition(
    ctx: &mut MessageContext,
    object: ObjectHandle,
    attributes: HashSet<AttributeHandle>,
) -> Result<(), FederateError> {
    let local = ctx.local();
    // A grant that was already in flight when the cancel went out wins:
    // anything the local federate now owns, or that sits in a released
    // claim bound for it, is past cancelling.
    let granted = ctx.state.ownership.attributes_released_to(object, local);
    let mut cancelled = HashSet::new();
    let mut kept = HashSet::new();
    for attribute in attributes {
        let owned = ctx
            .state
            .repository
            .attribute_owner(object, attribute)
            .is_ok_and(|owner| owner.is_owned_by(local));
        if owned || granted.contains(&attribute) {
            kept.insert(attribute);
        } else {
            cancelled.insert(attribute);
        }
    }
    if !kept.is_empty() {
        debug!(
            "[{local}] cancel of attributes {kept:?} on object [{object}] lost to a grant in flight"
        );
    }
    if !cancelled.is_empty() {
        ctx.state
            .ownership
            .cancel_acquisition(object, &cancelled, local);
        ctx.queue_callback(Callback::AcquisitionCancelled {
            object,
            attributes: cancelled,
        });
    }
    Ok(())
}

pub fn outgoing_cancel_divest(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::CancelDivest { object, attributes } = message else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let local = ctx.local();
    validate_owned(ctx.state, object, attributes)?;
    let offered = ctx.state.ownership.offers_by(object, attributes, local);
    for attribute in attributes {
        if !offered.contains(attribute) {
            return Err(OwnershipError::AttributeDivestitureWasNotRequested {
                object,
                attribute: *attribute,
            }
            .into());
        }
    }
    Ok(Flow::Await(PendingClaim::CancelDivest {
        object,
        attributes: attributes.clone(),
    }))
}

pub fn finalize_cancel_divest(
    ctx: &mut MessageContext,
    object: ObjectHandle,
    attributes: HashSet<AttributeHandle>,
) -> Result<(), FederateError> {
    let local = ctx.local();
    // Offers consumed by a release during the window stay consumed.
    let standing = ctx.state.ownership.offers_by(object, &attributes, local);
    if standing.len() < attributes.len() {
        let consumed: HashSet<AttributeHandle> =
            attributes.difference(&standing).copied().collect();
        debug!(
            "[{local}] divest of attributes {consumed:?} on object [{object}] completed before the cancel"
        );
    }
    if !standing.is_empty() {
        ctx.state.ownership.cancel_divest(object, &standing, local);
        ctx.queue_callback(Callback::DivestCancelled {
            object,
            attributes: standing,
        });
    }
    Ok(())
}

pub fn outgoing_query(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::QueryOwnership { object, attribute } = message else {
        return Ok(Flow::Continue);
    };
    let owner = ctx.state.repository.attribute_owner(*object, *attribute)?;
    ctx.queue_callback(Callback::OwnershipInfo {
        object: *object,
        attribute: *attribute,
        owner,
    });
    Ok(Flow::Handled)
}

// ---- incoming -----------------------------------------------------------

pub fn incoming_acquire(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::AttributeAcquire {
        object,
        attributes,
        if_available,
    } = message
    else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let source = ctx.source;
    debug!(
        "[{}] federate [{source}] wants attributes {attributes:?} of object [{object}] \
         (if_available={if_available})",
        ctx.local()
    );

    if *if_available {
        ctx.state
            .ownership
            .request_acquisition_if_available(object, attributes, source);
        return Ok(Flow::Handled);
    }

    ctx.state
        .ownership
        .request_acquisition(object, attributes, source);
    if ctx.state.repository.instance(object).is_none() {
        // The claim is recorded anyway; the instance may be discovered later.
        warn!(
            "[{}] acquisition request for undiscovered object [{object}]",
            ctx.local()
        );
        return Ok(Flow::Handled);
    }

    // Anything we had offered for divestiture is handed over immediately.
    let local = ctx.local();
    let offered = ctx.state.ownership.offers_by(object, attributes, local);
    if !offered.is_empty() {
        let release = Message::AttributeRelease {
            object,
            attributes: offered.clone(),
        };
        if let Err(failure) = reprocess_outgoing(ctx, &release) {
            error!(
                "[{local}] failed to release divested attributes {offered:?} of object \
                 [{object}]: {failure}"
            );
        }
    }

    // The application decides about the rest of what we own.
    let ours: HashSet<AttributeHandle> = attributes
        .iter()
        .filter(|attribute| !offered.contains(*attribute))
        .filter(|attribute| {
            ctx.state
                .repository
                .attribute_owner(object, **attribute)
                .is_ok_and(|owner| owner.is_owned_by(local))
        })
        .copied()
        .collect();
    if !ours.is_empty() {
        ctx.queue_callback(Callback::ReleaseRequested {
            object,
            attributes: ours,
        });
    }
    Ok(Flow::Handled)
}

pub fn incoming_release(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::AttributeRelease { object, attributes } = message else {
        return Ok(Flow::Continue);
    };
    let object = *object;

    // Mirror the owner's hand-over: each direct claim flips to released and
    // the repository already points at the claimant.
    let released = ctx.state.ownership.release_attributes(object, attributes);
    for (attribute, claimant) in &released {
        ctx.state
            .repository
            .set_attribute_owner(object, *attribute, Ownership::OwnedBy(*claimant));
    }
    // Offers the releasing federate had standing for these attributes are
    // spent by the hand-over.
    ctx.state.ownership.complete_divest(object, attributes);

    let local = ctx.local();
    let obtained = ctx.state.ownership.complete_acquisition(object, local);
    if !obtained.is_empty() {
        info!(
            "[{local}] was granted attributes {obtained:?} of object [{object}] by \
             federate [{}]",
            ctx.source
        );
        ctx.broadcast(Message::OwnershipAcquired {
            object,
            attributes: obtained.clone(),
            if_available: false,
        });
        ctx.queue_callback(Callback::OwnershipAcquired {
            object,
            attributes: obtained,
            if_available: false,
        });
    }
    Ok(Flow::Handled)
}

pub fn incoming_divest(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::AttributeDivest {
        object,
        attributes,
        unconditional,
    } = message
    else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let source = ctx.source;

    if *unconditional {
        for attribute in attributes {
            let owned = ctx
                .state
                .repository
                .attribute_owner(object, *attribute)
                .is_ok_and(|owner| owner.is_owned_by(source));
            if owned {
                ctx.state
                    .repository
                    .set_attribute_owner(object, *attribute, Ownership::Unowned);
            }
        }
        // Stale offers from an earlier negotiated divest are void now.
        ctx.state.ownership.cancel_divest(object, attributes, source);
        return Ok(Flow::Handled);
    }

    ctx.state
        .ownership
        .request_divestiture(object, attributes, source);

    // Offer the attributes to the local application if it publishes them.
    let Some(instance) = ctx.state.repository.instance(object) else {
        return Ok(Flow::Handled);
    };
    let class = instance.class();
    if !ctx.state.interests.is_class_published(class) {
        return Ok(Flow::Handled);
    }
    let takeable: HashSet<AttributeHandle> = attributes
        .iter()
        .filter(|attribute| ctx.state.interests.is_attribute_published(class, **attribute))
        .copied()
        .collect();
    if !takeable.is_empty() {
        ctx.queue_callback(Callback::OwnershipAssumptionRequested {
            object,
            attributes: takeable,
        });
    }
    Ok(Flow::Handled)
}

pub fn incoming_ownership_acquired(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::OwnershipAcquired {
        object, attributes, ..
    } = message
    else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let source = ctx.source;
    debug!(
        "[{}] federate [{source}] committed ownership of attributes {attributes:?} of \
         object [{object}]",
        ctx.local()
    );
    for attribute in attributes {
        ctx.state
            .repository
            .set_attribute_owner(object, *attribute, Ownership::OwnedBy(source));
    }
    // The transfer is settled; claim and offer records for it are spent.
    ctx.state.ownership.consume_claims(object, attributes);
    ctx.state.ownership.complete_divest(object, attributes);
    Ok(Flow::Handled)
}

pub fn incoming_cancel_acquire(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::CancelAcquire { object, attributes } = message else {
        return Ok(Flow::Continue);
    };
    // Released claims survive: that grant is already in flight and the
    // cancel lost to it.
    ctx.state
        .ownership
        .cancel_acquisition(*object, attributes, ctx.source);
    Ok(Flow::Handled)
}

pub fn incoming_cancel_divest(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::CancelDivest { object, attributes } = message else {
        return Ok(Flow::Continue);
    };
    ctx.state
        .ownership
        .cancel_divest(*object, attributes, ctx.source);
    Ok(Flow::Handled)
}

// ---- validation ----------------------------------------------------------

fn validate_acquire(
    state: &LocalState,
    object: ObjectHandle,
    attributes: &HashSet<AttributeHandle>,
) -> Result<(), FederateError> {
    let instance = state.repository.checked_instance(object)?;
    let class = instance.class();
    if !state.interests.is_class_published(class) {
        return Err(WorldError::ObjectClassNotPublished { class }.into());
    }
    for attribute in attributes {
        let record = instance
            .attribute(*attribute)
            .ok_or(WorldError::AttributeNotDefined {
                object,
                attribute: *attribute,
            })?;
        if record.is_owned_by(state.federate) {
            return Err(OwnershipError::FederateOwnsAttributes {
                object,
                attribute: *attribute,
            }
            .into());
        }
        if !state.interests.is_attribute_published(class, *attribute) {
            return Err(WorldError::AttributeNotPublished {
                class,
                attribute: *attribute,
            }
            .into());
        }
    }
    Ok(())
}

/// Checks that every attribute exists on the object and is owned by the
/// local federate.
fn validate_owned(
    state: &LocalState,
    object: ObjectHandle,
    attributes: &HashSet<AttributeHandle>,
) -> Result<(), FederateError> {
    let instance = state.repository.checked_instance(object)?;
    for attribute in attributes {
        let record = instance
            .attribute(*attribute)
            .ok_or(WorldError::AttributeNotDefined {
                object,
                attribute: *attribute,
            })?;
        if !record.is_owned_by(state.federate) {
            return Err(OwnershipError::AttributeNotOwned {
                object,
                attribute: *attribute,
                owner: record.owner().federate(),
            }
            .into());
        }
    }
    Ok(())
}

/// Splits the attributes into those currently unowned with no outstanding
/// claim and the rest.
fn split_by_availability(
    state: &LocalState,
    object: ObjectHandle,
    attributes: &HashSet<AttributeHandle>,
) -> (HashSet<AttributeHandle>, HashSet<AttributeHandle>) {
    let mut free = HashSet::new();
    let mut held = HashSet::new();
    for attribute in attributes {
        let unowned = state
            .repository
            .attribute_owner(object, *attribute)
            .is_ok_and(|owner| owner.is_unowned());
        if unowned && !state.ownership.is_claimed(object, *attribute) {
            free.insert(*attribute);
        } else {
            held.insert(*attribute);
        }
    }
    (free, held)
}
