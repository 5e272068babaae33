use std::collections::{HashMap, HashSet};

use crate::types::FederateHandle;

/// Where a synchronization point is in its life.
///
/// `Requested` means the local federate is trying to register the label;
/// `Pending` means some other federate is. Retired (synchronized) points
/// are removed from the store entirely, which is what frees the label for
/// re-registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Requested,
    Pending,
    Announced,
    Achieved,
}

#[derive(Clone, Debug)]
pub struct SyncPoint {
    label: String,
    tag: Vec<u8>,
    /// Empty scope means federation-wide.
    scope: HashSet<FederateHandle>,
    registrant: FederateHandle,
    achieved: HashSet<FederateHandle>,
    status: SyncStatus,
}

impl SyncPoint {
    fn new(
        label: String,
        tag: Vec<u8>,
        scope: HashSet<FederateHandle>,
        registrant: FederateHandle,
        status: SyncStatus,
    ) -> Self {
        Self {
            label,
            tag,
            scope,
            registrant,
            achieved: HashSet::new(),
            status,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    pub fn scope(&self) -> &HashSet<FederateHandle> {
        &self.scope
    }

    pub fn registrant(&self) -> FederateHandle {
        self.registrant
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn is_federation_wide(&self) -> bool {
        self.scope.is_empty()
    }

    pub fn in_scope(&self, federate: FederateHandle) -> bool {
        self.is_federation_wide() || self.scope.contains(&federate)
    }

    pub fn has_achieved(&self, federate: FederateHandle) -> bool {
        self.achieved.contains(&federate)
    }

    /// True once every federate in `roster` that the point applies to has
    /// achieved it. Resigned federates have already left the roster, so
    /// they can never hold the barrier open.
    pub fn is_synchronized(&self, roster: &HashSet<FederateHandle>) -> bool {
        roster
            .iter()
            .filter(|federate| self.in_scope(**federate))
            .all(|federate| self.achieved.contains(federate))
    }
}

/// The local registry of synchronization points.
#[derive(Debug, Default)]
pub struct SyncPointStore {
    points: HashMap<String, SyncPoint>,
}

impl SyncPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.points.contains_key(label)
    }

    pub fn point(&self, label: &str) -> Option<&SyncPoint> {
        self.points.get(label)
    }

    pub fn labels(&self) -> Vec<String> {
        self.points.keys().cloned().collect()
    }

    /// Starts a local registration attempt. Fails if any point, in any
    /// state, already holds the label.
    pub fn register_requested(
        &mut self,
        label: &str,
        tag: Vec<u8>,
        scope: HashSet<FederateHandle>,
        registrant: FederateHandle,
    ) -> bool {
        if self.points.contains_key(label) {
            return false;
        }
        self.points.insert(
            label.to_string(),
            SyncPoint::new(
                label.to_string(),
                tag,
                scope,
                registrant,
                SyncStatus::Requested,
            ),
        );
        true
    }

    /// Records a remote registration intent. On a contested label the
    /// lower registrant handle wins; the local `Requested` status is left
    /// alone so the registering caller discovers the loss at its re-check.
    pub fn record_registration_intent(&mut self, label: &str, registrant: FederateHandle) {
        match self.points.get_mut(label) {
            None => {
                self.points.insert(
                    label.to_string(),
                    SyncPoint::new(
                        label.to_string(),
                        Vec::new(),
                        HashSet::new(),
                        registrant,
                        SyncStatus::Pending,
                    ),
                );
            }
            Some(point) => match point.status {
                SyncStatus::Requested | SyncStatus::Pending => {
                    if registrant < point.registrant {
                        point.registrant = registrant;
                    }
                }
                // announced or later: the label is already spoken for
                _ => {}
            },
        }
    }

    /// Records an announcement, creating or overwriting the point.
    pub fn point_announced(
        &mut self,
        label: &str,
        tag: Vec<u8>,
        scope: HashSet<FederateHandle>,
        registrant: FederateHandle,
    ) {
        match self.points.get_mut(label) {
            None => {
                self.points.insert(
                    label.to_string(),
                    SyncPoint::new(
                        label.to_string(),
                        tag,
                        scope,
                        registrant,
                        SyncStatus::Announced,
                    ),
                );
            }
            Some(point) => {
                point.tag = tag;
                point.scope = scope;
                point.registrant = registrant;
                point.status = SyncStatus::Announced;
            }
        }
    }

    /// Transitions a locally `Requested` point to `Announced` after its
    /// registrant won the wait-window re-check.
    pub fn mark_announced(&mut self, label: &str) {
        if let Some(point) = self.points.get_mut(label) {
            point.status = SyncStatus::Announced;
        }
    }

    /// Parks a locally `Requested` point that lost its registration race.
    pub fn mark_pending(&mut self, label: &str) {
        if let Some(point) = self.points.get_mut(label) {
            point.status = SyncStatus::Pending;
        }
    }

    /// Records that `federate` achieved the point. `local` distinguishes
    /// the local federate's own achievement, which moves the point's status.
    pub fn achieve(&mut self, label: &str, federate: FederateHandle, local: bool) {
        if let Some(point) = self.points.get_mut(label) {
            point.achieved.insert(federate);
            if local {
                point.status = SyncStatus::Achieved;
            }
        }
    }

    /// Retires a synchronized point, freeing the label for reuse.
    pub fn retire(&mut self, label: &str) -> Option<SyncPoint> {
        self.points.remove(label)
    }
}
