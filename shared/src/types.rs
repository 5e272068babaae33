pub type FederateHandle = u16;
pub type ClassHandle = u16;
pub type AttributeHandle = u16;
pub type ObjectHandle = u32;

/// Every object class carries this attribute. Whoever owns it for an
/// instance holds the right to delete that instance.
pub const PRIVILEGE_TO_DELETE: AttributeHandle = 0;

/// Ownership state of a single attribute instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    Unowned,
    OwnedBy(FederateHandle),
}

impl Ownership {
    pub fn is_unowned(&self) -> bool {
        *self == Ownership::Unowned
    }

    pub fn is_owned_by(&self, federate: FederateHandle) -> bool {
        *self == Ownership::OwnedBy(federate)
    }

    /// The owning federate handle, if a federate owns the attribute.
    pub fn federate(&self) -> Option<FederateHandle> {
        match self {
            Ownership::OwnedBy(federate) => Some(*federate),
            Ownership::Unowned => None,
        }
    }
}
