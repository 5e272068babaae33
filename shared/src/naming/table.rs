use std::collections::HashMap;

use crate::types::{FederateHandle, ObjectHandle};

/// The two sources of name unavailability: outstanding reservations and
/// names already bound to live object instances.
#[derive(Debug, Default)]
pub struct NameTable {
    reservations: HashMap<String, FederateHandle>,
    bound: HashMap<String, ObjectHandle>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserver_of(&self, name: &str) -> Option<FederateHandle> {
        self.reservations.get(name).copied()
    }

    pub fn bound_to(&self, name: &str) -> Option<ObjectHandle> {
        self.bound.get(name).copied()
    }

    pub fn is_available(&self, name: &str) -> bool {
        !self.reservations.contains_key(name) && !self.bound.contains_key(name)
    }

    /// Records a reservation claim, resolving a contested name in favor of
    /// the lower federate handle. Returns the claimant now holding the name.
    pub fn record_claim(&mut self, name: &str, federate: FederateHandle) -> FederateHandle {
        match self.reservations.get_mut(name) {
            None => {
                self.reservations.insert(name.to_string(), federate);
                federate
            }
            Some(existing) => {
                if federate < *existing {
                    *existing = federate;
                }
                *existing
            }
        }
    }

    /// Drops a reservation held by `federate`, whether abandoned or
    /// consumed by registration. Reservations by anyone else are left alone.
    pub fn remove_reservation(&mut self, name: &str, federate: FederateHandle) -> bool {
        if self.reservations.get(name) == Some(&federate) {
            self.reservations.remove(name);
            true
        } else {
            false
        }
    }

    pub fn bind(&mut self, name: &str, object: ObjectHandle) {
        self.bound.insert(name.to_string(), object);
    }

    pub fn unbind(&mut self, name: &str) {
        self.bound.remove(name);
    }

    pub fn drop_federate(&mut self, federate: FederateHandle) {
        self.reservations.retain(|_, reserver| *reserver != federate);
    }
}
