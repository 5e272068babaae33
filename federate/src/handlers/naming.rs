//! Object name reservation and release. A reservation intent goes through
//! the claim window like any other claim; the pre-check against known
//! reservations and bound names only avoids pointless traffic.

use log::debug;

use fedsim_shared::{Callback, Message, NamingError};

use crate::error::FederateError;
use crate::pipeline::{Flow, MessageContext, PendingClaim};

pub fn outgoing_reserve(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::ReserveObjectName { name } = message else {
        return Ok(Flow::Continue);
    };
    if name.is_empty() {
        return Err(NamingError::IllegalName.into());
    }

    // A name already spoken for is a failed reservation, not an error.
    if ctx.state.names.reserver_of(name).is_some() || ctx.state.names.bound_to(name).is_some() {
        debug!("[{}] object name [{name}] is already in use", ctx.local());
        ctx.queue_callback(Callback::NameReservationFailed { name: name.clone() });
        return Ok(Flow::Handled);
    }

    let local = ctx.local();
    ctx.state.names.record_claim(name, local);
    Ok(Flow::Await(PendingClaim::NameReservation {
        name: name.clone(),
    }))
}

pub fn finalize_reservation(ctx: &mut MessageContext, name: String) -> Result<(), FederateError> {
    let local = ctx.local();
    if ctx.state.names.reserver_of(&name) == Some(local) {
        ctx.queue_callback(Callback::NameReservationSucceeded { name });
    } else {
        // A lower-handle claim arrived during the window and displaced ours.
        debug!("[{local}] lost the reservation race for object name [{name}]");
        ctx.queue_callback(Callback::NameReservationFailed { name });
    }
    Ok(())
}

pub fn outgoing_release_name(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::ReleaseObjectName { name } = message else {
        return Ok(Flow::Continue);
    };
    let local = ctx.local();
    if ctx.state.names.reserver_of(name) != Some(local) {
        return Err(NamingError::NameNotReservedByYou { name: name.clone() }.into());
    }
    ctx.state.names.remove_reservation(name, local);
    ctx.broadcast(Message::ReleaseObjectName { name: name.clone() });
    Ok(Flow::Handled)
}

pub fn incoming_reserve(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::ReserveObjectName { name } = message else {
        return Ok(Flow::Continue);
    };
    ctx.state.names.record_claim(name, ctx.source);
    Ok(Flow::Handled)
}

pub fn incoming_release_name(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::ReleaseObjectName { name } = message else {
        return Ok(Flow::Continue);
    };
    ctx.state.names.remove_reservation(name, ctx.source);
    Ok(Flow::Handled)
}
