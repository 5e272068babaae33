//! Synchronization points: registration (raced through the claim window),
//! announcement, achievement and the synchronized check.

use std::collections::HashSet;

use log::{debug, info, warn};

use fedsim_shared::{Callback, FederateHandle, Message, SyncError, SyncStatus};

use crate::error::FederateError;
use crate::pipeline::{Flow, MessageContext, PendingClaim};

// ---- outgoing -----------------------------------------------------------

pub fn outgoing_register(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::RegisterSyncPoint { label, tag, scope } = message else {
        return Ok(Flow::Continue);
    };
    if label.trim().is_empty() {
        return Err(SyncError::IllegalLabel.into());
    }

    // A scope naming unknown federates is a registration failure, not an
    // error: the caller learns through the result callback.
    for federate in scope {
        if !ctx.state.roster.contains(federate) {
            debug!(
                "[{}] scope for sync point [{label}] names unknown federate [{federate}]",
                ctx.local()
            );
            ctx.queue_callback(Callback::SyncRegistrationFailed {
                label: label.clone(),
                reason: format!("unknown federate [{federate}] in scope"),
            });
            return Ok(Flow::Handled);
        }
    }

    let local = ctx.local();
    if !ctx
        .state
        .sync_points
        .register_requested(label, tag.clone(), scope.clone(), local)
    {
        ctx.queue_callback(Callback::SyncRegistrationFailed {
            label: label.clone(),
            reason: "label is already in use".to_string(),
        });
        return Ok(Flow::Handled);
    }

    debug!("[{local}] requesting registration of sync point [{label}]");
    Ok(Flow::Await(PendingClaim::SyncRegistration {
        label: label.clone(),
        tag: tag.clone(),
        scope: scope.clone(),
    }))
}

pub fn finalize_registration(
    ctx: &mut MessageContext,
    label: String,
    tag: Vec<u8>,
    scope: HashSet<FederateHandle>,
) -> Result<(), FederateError> {
    let local = ctx.local();
    let standing = ctx
        .state
        .sync_points
        .point(&label)
        .map(|point| (point.registrant(), point.status()));

    match standing {
        None => {
            warn!("[{local}] sync point [{label}] disappeared during registration");
            ctx.queue_callback(Callback::SyncRegistrationFailed {
                label,
                reason: "label is already in use".to_string(),
            });
        }
        Some((_, SyncStatus::Announced)) | Some((_, SyncStatus::Achieved)) => {
            ctx.queue_callback(Callback::SyncRegistrationFailed {
                label,
                reason: "label is already announced".to_string(),
            });
        }
        Some((registrant, _)) if registrant != local => {
            // Lost the race to a lower handle; keep the record until that
            // federate's announce arrives.
            ctx.state.sync_points.mark_pending(&label);
            ctx.queue_callback(Callback::SyncRegistrationFailed {
                label,
                reason: format!("registered by federate [{registrant}]"),
            });
        }
        Some(_) => {
            ctx.state.sync_points.mark_announced(&label);
            info!("[{local}] registered sync point [{label}]");
            ctx.broadcast(Message::RegisterSyncPoint {
                label: label.clone(),
                tag: tag.clone(),
                scope,
            });
            ctx.queue_callback(Callback::SyncRegistrationSucceeded {
                label: label.clone(),
            });
            // The registrant hears the announcement like everyone else.
            ctx.queue_callback(Callback::SyncPointAnnounced { label, tag });
        }
    }
    Ok(())
}

pub fn outgoing_achieved(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::SyncPointAchieved { label } = message else {
        return Ok(Flow::Continue);
    };
    let announced = ctx
        .state
        .sync_points
        .point(label)
        .is_some_and(|point| point.status() == SyncStatus::Announced);
    if !announced {
        return Err(SyncError::LabelNotAnnounced {
            label: label.clone(),
        }
        .into());
    }

    let local = ctx.local();
    ctx.state.sync_points.achieve(label, local, true);
    info!("[{local}] achieved sync point [{label}]");
    ctx.broadcast(Message::SyncPointAchieved {
        label: label.clone(),
    });
    check_synchronized(ctx, label);
    Ok(Flow::Handled)
}

// ---- incoming -----------------------------------------------------------

pub fn incoming_registration_request(
    ctx: &mut MessageContext,
    message: &Message,
) -> Result<Flow, FederateError> {
    let Message::SyncRegistrationRequest { label } = message else {
        return Ok(Flow::Continue);
    };
    ctx.state
        .sync_points
        .record_registration_intent(label, ctx.source);
    Ok(Flow::Handled)
}

pub fn incoming_announce(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::RegisterSyncPoint { label, tag, scope } = message else {
        return Ok(Flow::Continue);
    };
    ctx.state
        .sync_points
        .point_announced(label, tag.clone(), scope.clone(), ctx.source);
    let local = ctx.local();
    if scope.is_empty() || scope.contains(&local) {
        ctx.queue_callback(Callback::SyncPointAnnounced {
            label: label.clone(),
            tag: tag.clone(),
        });
    }
    Ok(Flow::Handled)
}

pub fn incoming_achieved(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::SyncPointAchieved { label } = message else {
        return Ok(Flow::Continue);
    };
    if !ctx.state.sync_points.contains(label) {
        warn!(
            "[{}] federate [{}] achieved unknown sync point [{label}]",
            ctx.local(),
            ctx.source
        );
        return Ok(Flow::Handled);
    }
    ctx.state.sync_points.achieve(label, ctx.source, false);
    check_synchronized(ctx, label);
    Ok(Flow::Handled)
}

/// Retires the point and notifies the application once every in-scope
/// federate still on the roster has achieved it. Called after every local
/// or remote achievement and after every roster shrink.
pub fn check_synchronized(ctx: &mut MessageContext, label: &str) {
    let local = ctx.local();
    let Some(point) = ctx.state.sync_points.point(label) else {
        return;
    };
    if !matches!(point.status(), SyncStatus::Announced | SyncStatus::Achieved) {
        return;
    }
    if !point.is_synchronized(&ctx.state.roster) {
        return;
    }
    let in_scope = point.in_scope(local);
    ctx.state.sync_points.retire(label);
    info!("[{local}] federation synchronized on point [{label}]");
    if in_scope {
        ctx.queue_callback(Callback::FederationSynchronized {
            label: label.to_string(),
        });
    }
}
