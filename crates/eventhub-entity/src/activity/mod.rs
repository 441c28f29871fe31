//! Per-user, per-event activity: role and status.

pub mod record;
pub mod role;
pub mod status;

pub use record::ActivityRecord;
pub use role::Role;
pub use status::ActivityStatus;
