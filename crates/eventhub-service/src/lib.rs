//! # eventhub-service
//!
//! Membership orchestration for EventHub. An event's roster and each
//! user's activity records describe the same membership facts from two
//! sides and live in two separately stored aggregates; the services here
//! apply every transition to both.
//!
//! Services follow constructor injection: stores and shared lock tables
//! are provided at construction time via `Arc` references. See
//! [`Services`] for the standard wiring.

pub mod aggregates;
pub mod context;
pub mod event;
pub mod locks;
pub mod membership;
pub mod permission;
pub mod reconcile;
pub mod registry;
pub mod user;

pub use aggregates::AggregateStore;
pub use context::RequestContext;
pub use event::{CreateEventRequest, EventService, UpdateEventRequest};
pub use locks::{KeyedGuard, KeyedLocks};
pub use membership::{CrewService, Participants, RegistrationService};
pub use permission::{Operation, Relation, authorize};
pub use reconcile::{MembershipReconciler, ReconcileReport, ReconcileScheduler, ReconcileSummary};
pub use registry::Services;
pub use user::UserService;
