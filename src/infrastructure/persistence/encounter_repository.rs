use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::application::ports::outbound::{EncounterRepositoryPort, SharedEncounter};
use crate::domain::aggregates::{EncounterRetention, EncounterSession};
use crate::domain::value_objects::EncounterId;

/// Live encounters keyed by id. The map lock is only held for lookups; each
/// encounter carries its own lock.
#[derive(Default)]
pub struct InMemoryEncounterRepository {
    encounters: RwLock<HashMap<EncounterId, SharedEncounter>>,
}

impl InMemoryEncounterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EncounterRepositoryPort for InMemoryEncounterRepository {
    async fn insert(&self, session: EncounterSession) -> SharedEncounter {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.encounters.write().await.insert(id, shared.clone());
        shared
    }

    async fn get(&self, id: EncounterId) -> Option<SharedEncounter> {
        self.encounters.read().await.get(&id).cloned()
    }

    async fn evict_stale(&self, retention: &EncounterRetention, now: DateTime<Utc>) -> usize {
        let mut encounters = self.encounters.write().await;
        let before = encounters.len();
        // A locked encounter is in use right now
        encounters.retain(|_, shared| match shared.try_lock() {
            Ok(session) => !session.is_stale(retention, now),
            Err(_) => true,
        });
        before - encounters.len()
    }

    async fn count(&self) -> usize {
        self.encounters.read().await.len()
    }
}
