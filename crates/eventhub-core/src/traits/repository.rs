//! Generic repository trait for aggregate persistence.

use async_trait::async_trait;

use crate::result::AppResult;

/// Generic persistence trait for a versioned aggregate.
///
/// Implementations use optimistic concurrency: `replace` must fail with a
/// [`Conflict`](crate::error::ErrorKind::Conflict) error when the stored
/// version differs from the version carried by the entity, and otherwise
/// store the entity with its version incremented. Aggregate-specific
/// lookups are defined on the extension traits in `eventhub-database`.
#[async_trait]
pub trait Repository<Entity, Id>: Send + Sync + 'static
where
    Entity: Send + Sync + 'static + serde::Serialize,
    Id: Send + Sync + 'static,
{
    /// Find an aggregate by its identifier.
    async fn get_by_id(&self, id: &Id) -> AppResult<Option<Entity>>;

    /// Insert a new aggregate. Fails with `Conflict` if the id is taken.
    async fn insert(&self, entity: &Entity) -> AppResult<Entity>;

    /// Replace an existing aggregate, returning it with its new version.
    async fn replace(&self, entity: &Entity) -> AppResult<Entity>;

    /// Delete an aggregate by its identifier. Returns `true` if deleted.
    async fn delete(&self, id: &Id) -> AppResult<bool>;

    /// List every stored identifier.
    async fn list_ids(&self) -> AppResult<Vec<Id>>;
}
