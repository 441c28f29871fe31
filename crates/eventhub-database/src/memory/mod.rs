//! In-memory stores backed by `DashMap`.
//!
//! Suitable for tests and single-node deployments only; nothing survives
//! a restart.

pub mod event;
pub mod user;

pub use event::MemoryEventStore;
pub use user::MemoryUserStore;
