//! In-memory user store.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_core::traits::Repository;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::user::User;

use crate::store::{UserStore, stale_write};

/// User store keeping every aggregate in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<UserId, User>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<User, UserId> for MemoryUserStore {
    async fn get_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        match self.users.entry(user.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "User {} already exists",
                user.id
            ))),
            Entry::Vacant(slot) => {
                let mut stored = user.clone();
                stored.version = 1;
                slot.insert(stored.clone());
                debug!(user_id = %user.id, "User inserted");
                Ok(stored)
            }
        }
    }

    async fn replace(&self, user: &User) -> AppResult<User> {
        let mut current = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found(format!("User {} not found", user.id)))?;

        if current.version != user.version {
            return Err(stale_write("user", user.id, user.version, current.version));
        }

        let mut stored = user.clone();
        stored.version = user.version + 1;
        *current = stored.clone();
        Ok(stored)
    }

    async fn delete(&self, id: &UserId) -> AppResult<bool> {
        Ok(self.users.remove(id).is_some())
    }

    async fn list_ids(&self) -> AppResult<Vec<UserId>> {
        let mut ids: Vec<UserId> = self.users.iter().map(|u| *u.key()).collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone()))
    }

    async fn list_by_event(&self, event_id: &EventId) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.has_activity(event_id))
            .map(|u| u.value().clone())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn list_activity_event_ids(&self) -> AppResult<Vec<EventId>> {
        let ids: BTreeSet<EventId> = self
            .users
            .iter()
            .flat_map(|u| {
                u.activities()
                    .iter()
                    .map(|record| record.event_id)
                    .collect::<Vec<_>>()
            })
            .collect();
        Ok(ids.into_iter().collect())
    }
}
