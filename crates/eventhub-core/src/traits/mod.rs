//! Core traits defined in `eventhub-core` and implemented by other crates.

pub mod repository;
pub mod service;

pub use repository::Repository;
pub use service::Service;
