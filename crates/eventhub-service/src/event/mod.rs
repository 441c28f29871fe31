//! Event lifecycle: create, update, cancel, delete.

pub mod service;

pub use service::{CreateEventRequest, EventService, UpdateEventRequest};
