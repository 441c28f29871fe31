//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use eventhub_core::config::MembershipConfig;
use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_core::traits::Repository;
use eventhub_core::types::{EventId, UserId};
use eventhub_database::memory::{MemoryEventStore, MemoryUserStore};
use eventhub_database::store::{EventStore, UserStore};
use eventhub_entity::activity::{ActivityStatus, Role};
use eventhub_entity::event::Event;
use eventhub_entity::user::{CreateUser, User};
use eventhub_service::{CreateEventRequest, RequestContext, Services};

/// Switches that make the wrapped stores fail on demand.
#[derive(Debug, Default)]
pub struct Faults {
    /// Fail every event replace.
    pub event_replace: AtomicBool,
    /// Fail every event delete.
    pub event_delete: AtomicBool,
    /// Let this many user replaces through, then fail the rest.
    pub user_replace_budget: AtomicUsize,
    /// Bump the stored user's version right before the next user replace.
    pub race_next_user_replace: AtomicBool,
    /// Delay every user lookup by id, in milliseconds.
    pub user_read_delay_ms: AtomicU64,
}

impl Faults {
    fn new() -> Self {
        let faults = Self::default();
        faults.user_replace_budget.store(usize::MAX, Ordering::SeqCst);
        faults
    }

    fn injected(what: &str) -> AppError {
        AppError::database(format!("injected {what} failure"))
    }
}

/// Event store that consults [`Faults`] before delegating.
#[derive(Debug, Clone)]
pub struct FaultyEventStore {
    pub inner: MemoryEventStore,
    faults: Arc<Faults>,
}

#[async_trait]
impl Repository<Event, EventId> for FaultyEventStore {
    async fn get_by_id(&self, id: &EventId) -> AppResult<Option<Event>> {
        self.inner.get_by_id(id).await
    }

    async fn insert(&self, event: &Event) -> AppResult<Event> {
        self.inner.insert(event).await
    }

    async fn replace(&self, event: &Event) -> AppResult<Event> {
        if self.faults.event_replace.load(Ordering::SeqCst) {
            return Err(Faults::injected("event replace"));
        }
        self.inner.replace(event).await
    }

    async fn delete(&self, id: &EventId) -> AppResult<bool> {
        if self.faults.event_delete.load(Ordering::SeqCst) {
            return Err(Faults::injected("event delete"));
        }
        self.inner.delete(id).await
    }

    async fn list_ids(&self) -> AppResult<Vec<EventId>> {
        self.inner.list_ids().await
    }
}

#[async_trait]
impl EventStore for FaultyEventStore {
    async fn get_by_title(&self, title: &str) -> AppResult<Option<Event>> {
        self.inner.get_by_title(title).await
    }
}

/// User store that consults [`Faults`] before delegating.
#[derive(Debug, Clone)]
pub struct FaultyUserStore {
    pub inner: MemoryUserStore,
    faults: Arc<Faults>,
}

#[async_trait]
impl Repository<User, UserId> for FaultyUserStore {
    async fn get_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        let delay = self.faults.user_read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        self.inner.get_by_id(id).await
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        self.inner.insert(user).await
    }

    async fn replace(&self, user: &User) -> AppResult<User> {
        let budget = &self.faults.user_replace_budget;
        if budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_err()
        {
            return Err(Faults::injected("user replace"));
        }
        if self.faults.race_next_user_replace.swap(false, Ordering::SeqCst) {
            if let Some(current) = self.inner.get_by_id(&user.id).await? {
                self.inner.replace(&current).await?;
            }
        }
        self.inner.replace(user).await
    }

    async fn delete(&self, id: &UserId) -> AppResult<bool> {
        self.inner.delete(id).await
    }

    async fn list_ids(&self) -> AppResult<Vec<UserId>> {
        self.inner.list_ids().await
    }
}

#[async_trait]
impl UserStore for FaultyUserStore {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.inner.get_by_email(email).await
    }

    async fn list_by_event(&self, event_id: &EventId) -> AppResult<Vec<User>> {
        self.inner.list_by_event(event_id).await
    }

    async fn list_activity_event_ids(&self) -> AppResult<Vec<EventId>> {
        self.inner.list_activity_event_ids().await
    }
}

/// Services wired over fault-injecting in-memory stores.
pub struct TestApp {
    pub services: Services,
    pub events: FaultyEventStore,
    pub users: FaultyUserStore,
    pub faults: Arc<Faults>,
    counter: AtomicUsize,
}

impl TestApp {
    /// Create a test application with default membership settings.
    pub fn new() -> Self {
        Self::with_config(MembershipConfig::default())
    }

    /// Create a test application with custom membership settings.
    pub fn with_config(config: MembershipConfig) -> Self {
        let faults = Arc::new(Faults::new());
        let events = FaultyEventStore {
            inner: MemoryEventStore::new(),
            faults: Arc::clone(&faults),
        };
        let users = FaultyUserStore {
            inner: MemoryUserStore::new(),
            faults: Arc::clone(&faults),
        };
        let services = Services::new(
            Arc::new(events.clone()),
            Arc::new(users.clone()),
            &config,
        );

        Self {
            services,
            events,
            users,
            faults,
            counter: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> usize {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Context acting as `actor`.
    pub fn ctx(&self, actor: UserId) -> RequestContext {
        RequestContext::new(actor)
    }

    /// Create a user with a unique email.
    pub async fn user(&self, name: &str) -> UserId {
        let req = CreateUser {
            email: format!("{name}{}@example.com", self.next()),
            display_name: Some(name.to_string()),
        };
        self.services
            .users
            .create_user(&RequestContext::system(), req)
            .await
            .expect("create user")
            .id
    }

    /// Create an event organized by `organizer`, starting tomorrow.
    pub async fn event(&self, organizer: UserId) -> EventId {
        let now = Utc::now();
        let req = CreateEventRequest {
            title: format!("Meetup #{}", self.next()),
            description: "Monthly meetup".to_string(),
            starts_at: now + Duration::days(1),
            ends_at: now + Duration::days(1) + Duration::hours(2),
        };
        self.services
            .events
            .create_event(&self.ctx(organizer), EventId::new(), req)
            .await
            .expect("create event")
            .id
    }

    /// Stored event, bypassing the services.
    pub async fn stored_event(&self, id: &EventId) -> Event {
        self.events
            .inner
            .get_by_id(id)
            .await
            .expect("get event")
            .expect("event exists")
    }

    /// Stored user, bypassing the services.
    pub async fn stored_user(&self, id: &UserId) -> User {
        self.users
            .inner
            .get_by_id(id)
            .await
            .expect("get user")
            .expect("user exists")
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.faults.event_replace.store(false, Ordering::SeqCst);
        self.faults.event_delete.store(false, Ordering::SeqCst);
        self.faults
            .user_replace_budget
            .store(usize::MAX, Ordering::SeqCst);
        self.faults
            .race_next_user_replace
            .store(false, Ordering::SeqCst);
        self.faults.user_read_delay_ms.store(0, Ordering::SeqCst);
    }

    /// Check the roster/activity correspondence across every stored aggregate.
    pub async fn assert_consistent(&self) {
        let event_ids = self.events.inner.list_ids().await.expect("list events");
        let user_ids = self.users.inner.list_ids().await.expect("list users");
        let mut users = Vec::new();
        for id in &user_ids {
            users.push(self.stored_user(id).await);
        }

        for event_id in &event_ids {
            let event = self.stored_event(event_id).await;
            assert!(
                !event.roster().contains(&event.organizer_id),
                "organizer {} is on the roster of {}",
                event.organizer_id,
                event.id
            );
            for user in users.iter().filter(|u| u.id != event.organizer_id) {
                let expected = user
                    .activity(event_id)
                    .filter(|record| record.status == ActivityStatus::Active)
                    .map(|record| record.role);
                assert_eq!(
                    event.roster().role_of(&user.id),
                    expected,
                    "roster and activity disagree for user {} on event {}",
                    user.id,
                    event.id
                );
            }
            for (member, _) in event.roster().iter() {
                assert!(user_ids.contains(&member), "roster holds unknown user {member}");
            }
        }

        for user in &users {
            for record in user.activities() {
                assert!(
                    event_ids.contains(&record.event_id),
                    "user {} holds an activity for missing event {}",
                    user.id,
                    record.event_id
                );
                if record.role == Role::Organizer {
                    let event = self.stored_event(&record.event_id).await;
                    assert_eq!(event.organizer_id, user.id);
                }
            }
        }
    }
}
