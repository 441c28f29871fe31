//! Service marker trait.

/// Marker trait for business logic services.
///
/// All services in `eventhub-service` implement this trait so they can be
/// shared behind `Arc` across request handlers and scheduled jobs.
pub trait Service: Send + Sync + 'static {}
