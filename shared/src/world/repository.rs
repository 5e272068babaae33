use std::collections::HashMap;

use crate::types::{AttributeHandle, ClassHandle, FederateHandle, ObjectHandle, Ownership};
use crate::world::error::WorldError;

/// Ownership record for one attribute of one object instance.
#[derive(Clone, Debug)]
pub struct AttributeInstance {
    owner: Ownership,
}

impl AttributeInstance {
    pub fn new(owner: Ownership) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Ownership {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Ownership) {
        self.owner = owner;
    }

    pub fn unown(&mut self) {
        self.owner = Ownership::Unowned;
    }

    pub fn is_unowned(&self) -> bool {
        self.owner.is_unowned()
    }

    pub fn is_owned_by(&self, federate: FederateHandle) -> bool {
        self.owner.is_owned_by(federate)
    }
}

/// A registered or discovered object instance and the ownership state of
/// its attributes.
#[derive(Clone, Debug)]
pub struct ObjectInstance {
    handle: ObjectHandle,
    class: ClassHandle,
    name: Option<String>,
    attributes: HashMap<AttributeHandle, AttributeInstance>,
}

impl ObjectInstance {
    pub fn new(
        handle: ObjectHandle,
        class: ClassHandle,
        name: Option<String>,
        owners: HashMap<AttributeHandle, Ownership>,
    ) -> Self {
        let attributes = owners
            .into_iter()
            .map(|(attribute, owner)| (attribute, AttributeInstance::new(owner)))
            .collect();
        Self {
            handle,
            class,
            name,
            attributes,
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn class(&self) -> ClassHandle {
        self.class
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attribute(&self, attribute: AttributeHandle) -> Option<&AttributeInstance> {
        self.attributes.get(&attribute)
    }

    pub fn attribute_mut(&mut self, attribute: AttributeHandle) -> Option<&mut AttributeInstance> {
        self.attributes.get_mut(&attribute)
    }

    pub fn attribute_handles(&self) -> impl Iterator<Item = AttributeHandle> + '_ {
        self.attributes.keys().copied()
    }

    /// Snapshot of every attribute's owner, as carried by a discover message.
    pub fn owners(&self) -> HashMap<AttributeHandle, Ownership> {
        self.attributes
            .iter()
            .map(|(attribute, instance)| (*attribute, instance.owner()))
            .collect()
    }

    pub fn attributes_owned_by(&self, federate: FederateHandle) -> Vec<AttributeHandle> {
        self.attributes
            .iter()
            .filter(|(_, instance)| instance.is_owned_by(federate))
            .map(|(attribute, _)| *attribute)
            .collect()
    }
}

/// The local mirror of the federation's object instances.
///
/// Owned exclusively by the local runtime; remote federates only affect it
/// through inbound messages processed by the incoming handler chain.
#[derive(Debug, Default)]
pub struct Repository {
    objects: HashMap<ObjectHandle, ObjectInstance>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instance(&mut self, instance: ObjectInstance) {
        self.objects.insert(instance.handle(), instance);
    }

    pub fn remove_instance(&mut self, object: ObjectHandle) -> Option<ObjectInstance> {
        self.objects.remove(&object)
    }

    pub fn instance(&self, object: ObjectHandle) -> Option<&ObjectInstance> {
        self.objects.get(&object)
    }

    pub fn instance_mut(&mut self, object: ObjectHandle) -> Option<&mut ObjectInstance> {
        self.objects.get_mut(&object)
    }

    pub fn instances(&self) -> impl Iterator<Item = &ObjectInstance> {
        self.objects.values()
    }

    pub fn object_handles(&self) -> Vec<ObjectHandle> {
        self.objects.keys().copied().collect()
    }

    /// Checked lookup used by request validation.
    pub fn checked_instance(&self, object: ObjectHandle) -> Result<&ObjectInstance, WorldError> {
        self.objects
            .get(&object)
            .ok_or(WorldError::ObjectNotKnown { object })
    }

    /// Checked owner lookup used by request validation.
    pub fn attribute_owner(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<Ownership, WorldError> {
        let instance = self.checked_instance(object)?;
        instance
            .attribute(attribute)
            .map(AttributeInstance::owner)
            .ok_or(WorldError::AttributeNotDefined { object, attribute })
    }

    /// Sets the owner of an attribute, logging rather than failing when the
    /// record has disappeared underneath us (a delete can race a transfer).
    pub fn set_attribute_owner(
        &mut self,
        object: ObjectHandle,
        attribute: AttributeHandle,
        owner: Ownership,
    ) {
        match self
            .objects
            .get_mut(&object)
            .and_then(|instance| instance.attribute_mut(attribute))
        {
            Some(instance) => instance.set_owner(owner),
            None => log::warn!(
                "cannot change owner of attribute [{attribute}] on object [{object}]: not found"
            ),
        }
    }
}
