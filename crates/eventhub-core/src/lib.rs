//! # eventhub-core
//!
//! Core crate for EventHub. Contains the unified error system, configuration
//! schemas, typed identifiers, and the generic repository trait extended by
//! `eventhub-database` and consumed by `eventhub-service`.
//!
//! This crate has **no** internal dependencies on other EventHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorCategory, ErrorKind, Reason};
pub use result::AppResult;
