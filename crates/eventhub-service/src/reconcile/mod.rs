//! Repair of roster/activity drift left behind by partial writes.

pub mod reconciler;
pub mod scheduler;

pub use reconciler::{MembershipReconciler, ReconcileReport, ReconcileSummary};
pub use scheduler::ReconcileScheduler;
