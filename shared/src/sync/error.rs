use thiserror::Error;

/// Synchronization-point validation failures surfaced to the caller.
/// Losing a registration race is not among them; that is reported through
/// the registration-result callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("synchronization point label must not be empty")]
    IllegalLabel,

    #[error("synchronization point [{label}] has not been announced to the local federate")]
    LabelNotAnnounced { label: String },
}
