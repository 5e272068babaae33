use thiserror::Error;

/// Name-reservation validation failures. Losing a reservation race is not
/// an error; it arrives as a reservation-failed callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("object name must not be empty")]
    IllegalName,

    #[error("object name [{name}] is not reserved by the local federate")]
    NameNotReservedByYou { name: String },
}
