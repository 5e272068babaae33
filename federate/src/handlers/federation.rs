//! Resignation. A resigning federate's owned attributes are divested
//! unconditionally on every surviving peer, and its departure counts as an
//! implicit achievement for every open synchronization point.

use std::collections::HashSet;

use log::{error, info};

use fedsim_shared::{AttributeHandle, Message};

use crate::error::FederateError;
use crate::handlers::{reprocess_incoming, sync};
use crate::pipeline::{Flow, MessageContext};

pub fn outgoing_resign(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::ResignFederation = message else {
        return Ok(Flow::Continue);
    };
    ctx.state.joined = false;
    info!("[{}] resigning from the federation", ctx.local());
    ctx.broadcast(Message::ResignFederation);
    Ok(Flow::Handled)
}

pub fn incoming_resign(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::ResignFederation = message else {
        return Ok(Flow::Continue);
    };
    let source = ctx.source;
    info!("[{}] federate [{source}] resigned", ctx.local());
    ctx.state.roster.remove(&source);

    // Everything the resignee still owned becomes unowned, as if it had
    // divested unconditionally on the way out.
    for object in ctx.state.repository.object_handles() {
        let orphaned: HashSet<AttributeHandle> = ctx
            .state
            .repository
            .instance(object)
            .map(|instance| instance.attributes_owned_by(source).into_iter().collect())
            .unwrap_or_default();
        if orphaned.is_empty() {
            continue;
        }
        let divest = Message::AttributeDivest {
            object,
            attributes: orphaned,
            unconditional: true,
        };
        if let Err(failure) = reprocess_incoming(ctx, source, &divest) {
            error!(
                "[{}] failed to divest attributes of resigned federate [{source}] on \
                 object [{object}]: {failure}",
                ctx.local()
            );
        }
    }
    ctx.state.ownership.drop_federate(source);
    ctx.state.names.drop_federate(source);

    // The departure may complete an open barrier.
    for label in ctx.state.sync_points.labels() {
        sync::check_synchronized(ctx, &label);
    }
    Ok(Flow::Handled)
}
