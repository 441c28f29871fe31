//! # eventhub-entity
//!
//! Aggregates for EventHub. An [`Event`](event::Event) owns its roster of
//! co-organizers and standard participants; a [`User`](user::User) owns one
//! [`ActivityRecord`](activity::ActivityRecord) per event they ever joined.
//! Both carry a `version` used by the stores for optimistic concurrency.
//!
//! Nothing here performs I/O. Keeping the two aggregates consistent with
//! each other is the job of `eventhub-service`.

pub mod activity;
pub mod event;
pub mod user;

pub use activity::{ActivityRecord, ActivityStatus, Role};
pub use event::{Event, EventDetails, EventStatus, Roster};
pub use user::User;
