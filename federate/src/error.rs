use std::{error::Error, fmt};

use fedsim_shared::{NamingError, OwnershipError, SyncError, WorldError};

/// An error that can occur at the federate's API seam. Every variant is a
/// local validation failure; none of them mean a broadcast went out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FederateError {
    /// The federate has resigned and can no longer issue requests.
    NotJoined,
    World(WorldError),
    Ownership(OwnershipError),
    Sync(SyncError),
    Naming(NamingError),
}

impl fmt::Display for FederateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FederateError::NotJoined => write!(f, "federate is not joined to a federation"),
            FederateError::World(error) => error.fmt(f),
            FederateError::Ownership(error) => error.fmt(f),
            FederateError::Sync(error) => error.fmt(f),
            FederateError::Naming(error) => error.fmt(f),
        }
    }
}

impl Error for FederateError {}

impl From<WorldError> for FederateError {
    fn from(error: WorldError) -> Self {
        FederateError::World(error)
    }
}

impl From<OwnershipError> for FederateError {
    fn from(error: OwnershipError) -> Self {
        FederateError::Ownership(error)
    }
}

impl From<SyncError> for FederateError {
    fn from(error: SyncError) -> Self {
        FederateError::Sync(error)
    }
}

impl From<NamingError> for FederateError {
    fn from(error: NamingError) -> Self {
        FederateError::Naming(error)
    }
}
