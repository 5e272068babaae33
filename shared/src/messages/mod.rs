pub mod callback;
pub mod message;
