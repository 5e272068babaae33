pub mod error;
pub mod interests;
pub mod repository;
