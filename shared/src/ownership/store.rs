use std::collections::{HashMap, HashSet};

use crate::types::{AttributeHandle, FederateHandle, ObjectHandle};

/// How an acquisition claim was made.
///
/// `Released` marks a claim whose current owner has already let go of the
/// attribute; the transfer finishes when the claimant's commit notice
/// arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimKind {
    IfAvailable,
    Direct,
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquisitionClaim {
    pub federate: FederateHandle,
    pub kind: ClaimKind,
}

/// Records every outstanding acquisition claim and divest offer the local
/// federate knows about, its own included. Contested claims are resolved
/// here: for any attribute, the claim that survives is the one every
/// federate's store would independently pick, which is what lets the
/// federation converge without a coordinator.
#[derive(Debug, Default)]
pub struct OwnershipStore {
    acquisitions: HashMap<ObjectHandle, HashMap<AttributeHandle, AcquisitionClaim>>,
    divestitures: HashMap<ObjectHandle, HashMap<AttributeHandle, FederateHandle>>,
}

impl OwnershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- acquisition claims -------------------------------------------

    /// Records an if-available claim for each attribute, deferring to the
    /// tie-break rules where a claim already exists.
    pub fn request_acquisition_if_available(
        &mut self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
        federate: FederateHandle,
    ) {
        for attribute in attributes {
            self.update_claim(object, *attribute, federate, ClaimKind::IfAvailable);
        }
    }

    /// Records a direct claim for each attribute, deferring to the
    /// tie-break rules where a claim already exists.
    pub fn request_acquisition(
        &mut self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
        federate: FederateHandle,
    ) {
        for attribute in attributes {
            self.update_claim(object, *attribute, federate, ClaimKind::Direct);
        }
    }

    /// Tie-break rules for contested claims:
    ///
    /// - same kind: the lower federate handle wins, the higher is dropped;
    /// - a direct claim overwrites an if-available claim, never the reverse;
    /// - a released claim is only displaced by a new direct claim (the
    ///   owner may release and immediately re-request before the commit
    ///   notice has arrived).
    fn update_claim(
        &mut self,
        object: ObjectHandle,
        attribute: AttributeHandle,
        federate: FederateHandle,
        kind: ClaimKind,
    ) {
        let claims = self.acquisitions.entry(object).or_default();
        match claims.get_mut(&attribute) {
            None => {
                claims.insert(attribute, AcquisitionClaim { federate, kind });
            }
            Some(existing) => {
                if existing.kind == ClaimKind::Released {
                    if kind == ClaimKind::Direct {
                        *existing = AcquisitionClaim { federate, kind };
                    }
                } else if existing.kind == kind {
                    if federate < existing.federate {
                        existing.federate = federate;
                    }
                } else if kind == ClaimKind::Direct {
                    *existing = AcquisitionClaim { federate, kind };
                }
                // an if-available claim never displaces a direct one
            }
        }
    }

    pub fn claim(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Option<AcquisitionClaim> {
        self.acquisitions
            .get(&object)?
            .get(&attribute)
            .copied()
    }

    /// True if any claim, of any kind, exists for the attribute.
    pub fn is_claimed(&self, object: ObjectHandle, attribute: AttributeHandle) -> bool {
        self.claim(object, attribute).is_some()
    }

    /// The subset of `attributes` currently under an unreleased claim by
    /// `federate`.
    pub fn claims_by(
        &self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
        federate: FederateHandle,
    ) -> HashSet<AttributeHandle> {
        attributes
            .iter()
            .filter(|attribute| {
                self.claim(object, **attribute).is_some_and(|claim| {
                    claim.federate == federate && claim.kind != ClaimKind::Released
                })
            })
            .copied()
            .collect()
    }

    /// Direct claims against these attributes, regardless of claimant.
    pub fn direct_claims(
        &self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
    ) -> HashMap<AttributeHandle, FederateHandle> {
        attributes
            .iter()
            .filter_map(|attribute| {
                self.claim(object, *attribute)
                    .filter(|claim| claim.kind == ClaimKind::Direct)
                    .map(|claim| (*attribute, claim.federate))
            })
            .collect()
    }

    /// Marks direct claims against these attributes as released and returns
    /// the claimants. The claims stay in the store until the claimant's
    /// commit notice completes the transfer.
    pub fn release_attributes(
        &mut self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
    ) -> HashMap<AttributeHandle, FederateHandle> {
        let mut released = HashMap::new();
        if let Some(claims) = self.acquisitions.get_mut(&object) {
            for attribute in attributes {
                if let Some(claim) = claims.get_mut(attribute) {
                    if claim.kind == ClaimKind::Direct {
                        claim.kind = ClaimKind::Released;
                        released.insert(*attribute, claim.federate);
                    }
                }
            }
        }
        released
    }

    /// Attributes of the object already released to `federate`.
    pub fn attributes_released_to(
        &self,
        object: ObjectHandle,
        federate: FederateHandle,
    ) -> HashSet<AttributeHandle> {
        self.matching(object, federate, ClaimKind::Released)
    }

    /// Consumes the if-available claims still held by `federate` after its
    /// wait window, returning the attributes it won.
    pub fn complete_acquisition_if_available(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
    ) -> HashSet<AttributeHandle> {
        self.take_matching(object, federate, ClaimKind::IfAvailable)
    }

    /// Consumes the claims already released to `federate`, returning the
    /// attributes whose transfer is now complete.
    pub fn complete_acquisition(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
    ) -> HashSet<AttributeHandle> {
        self.take_matching(object, federate, ClaimKind::Released)
    }

    /// Drops unreleased claims held by `federate` for these attributes.
    /// Released claims stay: the cancel lost to a grant already in flight.
    pub fn cancel_acquisition(
        &mut self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
        federate: FederateHandle,
    ) {
        if let Some(claims) = self.acquisitions.get_mut(&object) {
            claims.retain(|attribute, claim| {
                !(attributes.contains(attribute)
                    && claim.federate == federate
                    && claim.kind != ClaimKind::Released)
            });
            if claims.is_empty() {
                self.acquisitions.remove(&object);
            }
        }
    }

    /// Drops any claim on these attributes, whoever holds it. Used when a
    /// transfer commits and the records are spent.
    pub fn consume_claims(&mut self, object: ObjectHandle, attributes: &HashSet<AttributeHandle>) {
        if let Some(claims) = self.acquisitions.get_mut(&object) {
            claims.retain(|attribute, _| !attributes.contains(attribute));
            if claims.is_empty() {
                self.acquisitions.remove(&object);
            }
        }
    }

    fn matching(
        &self,
        object: ObjectHandle,
        federate: FederateHandle,
        kind: ClaimKind,
    ) -> HashSet<AttributeHandle> {
        self.acquisitions
            .get(&object)
            .map(|claims| {
                claims
                    .iter()
                    .filter(|(_, claim)| claim.federate == federate && claim.kind == kind)
                    .map(|(attribute, _)| *attribute)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn take_matching(
        &mut self,
        object: ObjectHandle,
        federate: FederateHandle,
        kind: ClaimKind,
    ) -> HashSet<AttributeHandle> {
        let taken = self.matching(object, federate, kind);
        if !taken.is_empty() {
            self.consume_claims(object, &taken);
        }
        taken
    }

    // ---- divest offers -------------------------------------------------

    /// Records a standing offer by `federate` to give up these attributes.
    /// At most one offer may exist per attribute; callers validate that
    /// before recording.
    pub fn request_divestiture(
        &mut self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
        federate: FederateHandle,
    ) {
        let offers = self.divestitures.entry(object).or_default();
        for attribute in attributes {
            offers.entry(*attribute).or_insert(federate);
        }
    }

    pub fn is_under_divest(&self, object: ObjectHandle, attribute: AttributeHandle) -> bool {
        self.divestitures
            .get(&object)
            .is_some_and(|offers| offers.contains_key(&attribute))
    }

    /// The subset of `attributes` offered for divest by `federate`.
    pub fn offers_by(
        &self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
        federate: FederateHandle,
    ) -> HashSet<AttributeHandle> {
        self.divestitures
            .get(&object)
            .map(|offers| {
                attributes
                    .iter()
                    .filter(|attribute| offers.get(attribute) == Some(&federate))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Removes offers for these attributes and returns those that existed;
    /// the divest can be confirmed to the offering federate for them.
    pub fn complete_divest(
        &mut self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
    ) -> HashSet<AttributeHandle> {
        let mut completed = HashSet::new();
        if let Some(offers) = self.divestitures.get_mut(&object) {
            for attribute in attributes {
                if offers.remove(attribute).is_some() {
                    completed.insert(*attribute);
                }
            }
            if offers.is_empty() {
                self.divestitures.remove(&object);
            }
        }
        completed
    }

    /// Removes offers by `federate` for these attributes.
    pub fn cancel_divest(
        &mut self,
        object: ObjectHandle,
        attributes: &HashSet<AttributeHandle>,
        federate: FederateHandle,
    ) {
        if let Some(offers) = self.divestitures.get_mut(&object) {
            offers.retain(|attribute, offerer| {
                !(attributes.contains(attribute) && *offerer == federate)
            });
            if offers.is_empty() {
                self.divestitures.remove(&object);
            }
        }
    }

    // ---- housekeeping ---------------------------------------------------

    pub fn drop_object(&mut self, object: ObjectHandle) {
        self.acquisitions.remove(&object);
        self.divestitures.remove(&object);
    }

    /// Drops every claim and offer held by a federate that has left.
    pub fn drop_federate(&mut self, federate: FederateHandle) {
        self.acquisitions.retain(|_, claims| {
            claims.retain(|_, claim| claim.federate != federate);
            !claims.is_empty()
        });
        self.divestitures.retain(|_, offers| {
            offers.retain(|_, offerer| *offerer != federate);
            !offers.is_empty()
        });
    }
}
