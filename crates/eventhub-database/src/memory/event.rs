//! In-memory event store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_core::traits::Repository;
use eventhub_core::types::EventId;
use eventhub_entity::event::Event;

use crate::store::{EventStore, stale_write};

/// Event store keeping every aggregate in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: Arc<DashMap<EventId, Event>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl Repository<Event, EventId> for MemoryEventStore {
    async fn get_by_id(&self, id: &EventId) -> AppResult<Option<Event>> {
        Ok(self.events.get(id).map(|e| e.value().clone()))
    }

    async fn insert(&self, event: &Event) -> AppResult<Event> {
        match self.events.entry(event.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Event {} already exists",
                event.id
            ))),
            Entry::Vacant(slot) => {
                let mut stored = event.clone();
                stored.version = 1;
                slot.insert(stored.clone());
                debug!(event_id = %event.id, "Event inserted");
                Ok(stored)
            }
        }
    }

    async fn replace(&self, event: &Event) -> AppResult<Event> {
        let mut current = self
            .events
            .get_mut(&event.id)
            .ok_or_else(|| AppError::not_found(format!("Event {} not found", event.id)))?;

        if current.version != event.version {
            return Err(stale_write("event", event.id, event.version, current.version));
        }

        let mut stored = event.clone();
        stored.version = event.version + 1;
        *current = stored.clone();
        Ok(stored)
    }

    async fn delete(&self, id: &EventId) -> AppResult<bool> {
        Ok(self.events.remove(id).is_some())
    }

    async fn list_ids(&self) -> AppResult<Vec<EventId>> {
        let mut ids: Vec<EventId> = self.events.iter().map(|e| *e.key()).collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn get_by_title(&self, title: &str) -> AppResult<Option<Event>> {
        Ok(self
            .events
            .iter()
            .find(|e| e.title == title)
            .map(|e| e.value().clone()))
    }
}
