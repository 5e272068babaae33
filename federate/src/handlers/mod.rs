pub mod federation;
pub mod naming;
pub mod objects;
pub mod ownership;
pub mod sync;

use log::warn;

use fedsim_shared::{FederateHandle, Message, MessageKind};

use crate::error::FederateError;
use crate::pipeline::{Flow, HandlerFn, MessageContext, PendingClaim};

/// Chains for messages the local federate produces, in execution order.
pub fn outgoing_chains() -> Vec<(MessageKind, Vec<HandlerFn>)> {
    vec![
        (
            MessageKind::AttributeAcquire,
            vec![check_joined, ownership::outgoing_acquire],
        ),
        (
            MessageKind::AttributeDivest,
            vec![check_joined, ownership::outgoing_divest],
        ),
        (
            MessageKind::AttributeRelease,
            vec![check_joined, ownership::outgoing_release],
        ),
        (
            MessageKind::CancelAcquire,
            vec![check_joined, ownership::outgoing_cancel_acquire],
        ),
        (
            MessageKind::CancelDivest,
            vec![check_joined, ownership::outgoing_cancel_divest],
        ),
        (
            MessageKind::QueryOwnership,
            vec![check_joined, ownership::outgoing_query],
        ),
        (
            MessageKind::RegisterSyncPoint,
            vec![check_joined, sync::outgoing_register],
        ),
        (
            MessageKind::SyncPointAchieved,
            vec![check_joined, sync::outgoing_achieved],
        ),
        (
            MessageKind::ReserveObjectName,
            vec![check_joined, naming::outgoing_reserve],
        ),
        (
            MessageKind::ReleaseObjectName,
            vec![check_joined, naming::outgoing_release_name],
        ),
        (
            MessageKind::RegisterObject,
            vec![check_joined, objects::outgoing_register],
        ),
        (
            MessageKind::DeleteObject,
            vec![check_joined, objects::outgoing_delete],
        ),
        (
            MessageKind::ResignFederation,
            vec![check_joined, federation::outgoing_resign],
        ),
    ]
}

/// Chains for messages received from peers.
pub fn incoming_chains() -> Vec<(MessageKind, Vec<HandlerFn>)> {
    vec![
        (
            MessageKind::AttributeAcquire,
            vec![ownership::incoming_acquire],
        ),
        (
            MessageKind::AttributeDivest,
            vec![ownership::incoming_divest],
        ),
        (
            MessageKind::AttributeRelease,
            vec![ownership::incoming_release],
        ),
        (
            MessageKind::OwnershipAcquired,
            vec![ownership::incoming_ownership_acquired],
        ),
        (
            MessageKind::CancelAcquire,
            vec![ownership::incoming_cancel_acquire],
        ),
        (
            MessageKind::CancelDivest,
            vec![ownership::incoming_cancel_divest],
        ),
        (
            MessageKind::SyncRegistrationRequest,
            vec![sync::incoming_registration_request],
        ),
        (
            MessageKind::RegisterSyncPoint,
            vec![sync::incoming_announce],
        ),
        (
            MessageKind::SyncPointAchieved,
            vec![sync::incoming_achieved],
        ),
        (
            MessageKind::ReserveObjectName,
            vec![naming::incoming_reserve],
        ),
        (
            MessageKind::ReleaseObjectName,
            vec![naming::incoming_release_name],
        ),
        (
            MessageKind::DiscoverObject,
            vec![objects::incoming_discover],
        ),
        (MessageKind::DeleteObject, vec![objects::incoming_delete]),
        (
            MessageKind::ResignFederation,
            vec![federation::incoming_resign],
        ),
    ]
}

/// First link of every outgoing chain: a resigned federate may no longer
/// issue service calls.
fn check_joined(ctx: &mut MessageContext, _message: &Message) -> Result<Flow, FederateError> {
    if ctx.state.joined {
        Ok(Flow::Continue)
    } else {
        Err(FederateError::NotJoined)
    }
}

/// Run an outgoing chain from inside another handler, typically to push a
/// synthesized message (such as a forced release) through the normal path.
/// The caller keeps its own result; reprocessing never yields a wait.
pub fn reprocess_outgoing(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<(), FederateError> {
    let pipeline = ctx.pipeline;
    match pipeline.run_outgoing(ctx, message)? {
        Flow::Continue => {
            ctx.broadcast(message.clone());
            Ok(())
        }
        Flow::Handled => Ok(()),
        Flow::Await(_) => {
            warn!(
                "[{}] reprocessed {:?} wanted a claim window, dropping it",
                ctx.local(),
                message.kind()
            );
            Ok(())
        }
    }
}

/// Run an incoming chain for a message synthesized on behalf of a peer,
/// such as the implicit divest of a resigned federate's attributes.
pub fn reprocess_incoming(
    ctx: &mut MessageContext,
    source: FederateHandle,
    message: &Message,
) -> Result<(), FederateError> {
    let pipeline = ctx.pipeline;
    let previous = ctx.source;
    ctx.source = source;
    let result = pipeline.run_incoming(ctx, message);
    ctx.source = previous;
    result.map(|_| ())
}

/// Second phase of a deferred claim, run after the wait window with the
/// state lock re-taken.
pub fn finalize(ctx: &mut MessageContext, claim: PendingClaim) -> Result<(), FederateError> {
    match claim {
        PendingClaim::AcquireIfAvailable {
            object,
            attributes,
            unavailable,
        } => ownership::finalize_acquire_if_available(ctx, object, attributes, unavailable),
        PendingClaim::CancelAcquisition { object, attributes } => {
            ownership::finalize_cancel_acquisition(ctx, object, attributes)
        }
        PendingClaim::CancelDivest { object, attributes } => {
            ownership::finalize_cancel_divest(ctx, object, attributes)
        }
        PendingClaim::SyncRegistration { label, tag, scope } => {
            sync::finalize_registration(ctx, label, tag, scope)
        }
        PendingClaim::NameReservation { name } => naming::finalize_reservation(ctx, name),
    }
}
