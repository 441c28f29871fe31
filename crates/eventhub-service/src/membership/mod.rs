//! Membership transitions: self-service registration and crew moderation.
//!
//! Every transition here follows the same protocol: take the event's lock,
//! load the aggregates, check the permission matrix and the activity state,
//! mutate both aggregates in memory, then commit user before event.

pub mod crew;
pub mod registration;

pub use crew::CrewService;
pub use registration::{Participants, RegistrationService};
