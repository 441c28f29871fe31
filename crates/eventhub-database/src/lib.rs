//! # eventhub-database
//!
//! Store traits for the two EventHub aggregates plus two implementations:
//! process-local maps for tests and single-node runs, and PostgreSQL
//! tables holding each aggregate as a JSONB document with a version column.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryEventStore, MemoryUserStore};
pub use repositories::{PgEventStore, PgUserStore};
pub use store::{EventStore, UserStore};
