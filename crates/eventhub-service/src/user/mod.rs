//! User accounts and activity queries.

pub mod service;

pub use service::UserService;
