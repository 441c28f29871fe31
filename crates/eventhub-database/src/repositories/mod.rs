//! PostgreSQL document stores.
//!
//! Each row holds the whole aggregate in `document`; `version` is the
//! concurrency token and wins over whatever version the document carries.

pub mod event;
pub mod user;

pub use event::PgEventStore;
pub use user::PgUserStore;

use sqlx::types::Json;

/// Attach the version column to a decoded document.
pub(crate) fn with_version<T>(
    (Json(mut doc), version): (Json<T>, i64),
    set: impl FnOnce(&mut T, u64),
) -> T {
    set(&mut doc, version as u64);
    doc
}
