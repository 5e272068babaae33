//! Object instance lifecycle: registration, discovery and deletion.
//!
//! Registration is local-first: the instance is added to the repository
//! with every published attribute (plus the delete privilege) owned by the
//! registrant, then announced to the federation through a discover notice
//! carrying the full owner map.

use std::collections::HashMap;

use log::{debug, info};

use fedsim_shared::{
    AttributeHandle, Callback, Message, NamingError, ObjectHandle, ObjectInstance, Ownership,
    WorldError, PRIVILEGE_TO_DELETE,
};

use crate::error::FederateError;
use crate::pipeline::{Flow, MessageContext};

pub fn outgoing_register(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::RegisterObject { class, name } = message else {
        return Ok(Flow::Continue);
    };
    let class = *class;
    let local = ctx.local();
    if !ctx.state.interests.is_class_published(class) {
        return Err(WorldError::ObjectClassNotPublished { class }.into());
    }
    if let Some(name) = name {
        if name.is_empty() {
            return Err(NamingError::IllegalName.into());
        }
        let reserved_elsewhere = ctx
            .state
            .names
            .reserver_of(name)
            .is_some_and(|reserver| reserver != local);
        if reserved_elsewhere || ctx.state.names.bound_to(name).is_some() {
            return Err(WorldError::NameAlreadyInUse { name: name.clone() }.into());
        }
    }

    let object = ctx.state.next_object_handle();
    let mut owners: HashMap<AttributeHandle, Ownership> = ctx
        .state
        .interests
        .published_attributes(class)
        .into_iter()
        .map(|attribute| (attribute, Ownership::OwnedBy(local)))
        .collect();
    owners.insert(PRIVILEGE_TO_DELETE, Ownership::OwnedBy(local));

    ctx.state.repository.add_instance(ObjectInstance::new(
        object,
        class,
        name.clone(),
        owners.clone(),
    ));
    if let Some(name) = name {
        // Registration consumes the reservation and binds the name.
        ctx.state.names.remove_reservation(name, local);
        ctx.state.names.bind(name, object);
    }
    info!(
        "[{local}] registered object [{object}] of class [{class}]{}",
        name.as_deref()
            .map(|name| format!(" named [{name}]"))
            .unwrap_or_default()
    );
    ctx.broadcast(Message::DiscoverObject {
        object,
        class,
        name: name.clone(),
        owners,
    });
    ctx.registered_object = Some(object);
    Ok(Flow::Handled)
}

pub fn outgoing_delete(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::DeleteObject { object } = message else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    let local = ctx.local();
    let instance = ctx.state.repository.checked_instance(object)?;
    let privileged = instance
        .attribute(PRIVILEGE_TO_DELETE)
        .is_some_and(|record| record.is_owned_by(local));
    if !privileged {
        return Err(WorldError::DeletePrivilegeNotHeld { object }.into());
    }

    remove_instance(ctx, object);
    info!("[{local}] deleted object [{object}]");
    ctx.broadcast(Message::DeleteObject { object });
    Ok(Flow::Handled)
}

pub fn incoming_discover(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::DiscoverObject {
        object,
        class,
        name,
        owners,
    } = message
    else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    debug!(
        "[{}] discovered object [{object}] of class [{class}] from federate [{}]",
        ctx.local(),
        ctx.source
    );
    ctx.state.repository.add_instance(ObjectInstance::new(
        object,
        *class,
        name.clone(),
        owners.clone(),
    ));
    if let Some(name) = name {
        ctx.state.names.remove_reservation(name, ctx.source);
        ctx.state.names.bind(name, object);
    }
    ctx.queue_callback(Callback::ObjectDiscovered {
        object,
        class: *class,
        name: name.clone(),
    });
    Ok(Flow::Handled)
}

pub fn incoming_delete(ctx: &mut MessageContext, message: &Message) -> Result<Flow, FederateError> {
    let Message::DeleteObject { object } = message else {
        return Ok(Flow::Continue);
    };
    let object = *object;
    if ctx.state.repository.instance(object).is_none() {
        return Ok(Flow::Handled);
    }
    remove_instance(ctx, object);
    ctx.queue_callback(Callback::ObjectDeleted { object });
    Ok(Flow::Handled)
}

/// Drops the instance, its name binding and every claim or offer against it.
fn remove_instance(ctx: &mut MessageContext, object: ObjectHandle) {
    if let Some(instance) = ctx.state.repository.remove_instance(object) {
        if let Some(name) = instance.name() {
            ctx.state.names.unbind(name);
        }
    }
    ctx.state.ownership.drop_object(object);
}
