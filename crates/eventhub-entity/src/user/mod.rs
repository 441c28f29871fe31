//! User aggregate.

pub mod model;

pub use model::{CreateUser, User};
