//! Event aggregate.

pub mod model;
pub mod roster;
pub mod status;

pub use model::{Event, EventDetails};
pub use roster::Roster;
pub use status::EventStatus;
