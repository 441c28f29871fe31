//! Wiring of the services over one pair of stores.

use std::sync::Arc;
use std::time::Duration;

use eventhub_core::config::MembershipConfig;
use eventhub_database::memory::{MemoryEventStore, MemoryUserStore};
use eventhub_database::store::{EventStore, UserStore};

use crate::aggregates::AggregateStore;
use crate::event::EventService;
use crate::locks::KeyedLocks;
use crate::membership::{CrewService, RegistrationService};
use crate::reconcile::MembershipReconciler;
use crate::user::UserService;

/// Every service, sharing one store pair and one set of event locks.
#[derive(Debug, Clone)]
pub struct Services {
    pub events: Arc<EventService>,
    pub registration: Arc<RegistrationService>,
    pub crew: Arc<CrewService>,
    pub users: Arc<UserService>,
    pub reconciler: Arc<MembershipReconciler>,
}

impl Services {
    /// Build the services over the given stores.
    pub fn new(
        event_store: Arc<dyn EventStore>,
        user_store: Arc<dyn UserStore>,
        config: &MembershipConfig,
    ) -> Self {
        let store = AggregateStore::new(
            event_store,
            user_store,
            Duration::from_secs(config.operation_timeout_seconds),
        );
        let event_locks = Arc::new(KeyedLocks::new());
        let title_locks = Arc::new(KeyedLocks::new());

        Self {
            events: Arc::new(EventService::new(
                store.clone(),
                Arc::clone(&event_locks),
                title_locks,
            )),
            registration: Arc::new(RegistrationService::new(
                store.clone(),
                Arc::clone(&event_locks),
                config.allow_rejoin_after_leave,
            )),
            crew: Arc::new(CrewService::new(store.clone(), Arc::clone(&event_locks))),
            users: Arc::new(UserService::new(store.clone(), Arc::clone(&event_locks))),
            reconciler: Arc::new(MembershipReconciler::new(store, event_locks)),
        }
    }

    /// Services over fresh process-local stores.
    pub fn in_memory(config: &MembershipConfig) -> Self {
        Self::new(
            Arc::new(MemoryEventStore::new()),
            Arc::new(MemoryUserStore::new()),
            config,
        )
    }
}
