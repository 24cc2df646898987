use crate::domain::household::CorrelationKey;
use crate::domain::ports::CorrelationStore;
use crate::domain::slot::{ResultSlot, Transition};
use crate::domain::supplement::SupplementResult;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory correlation store.
///
/// Uses `Arc<RwLock<HashMap<CorrelationKey, ResultSlot>>>` so any number of
/// pollers can read while the dispatcher writes. Slots live for the lifetime
/// of the process.
#[derive(Default, Clone)]
pub struct InMemoryCorrelationStore {
    slots: Arc<RwLock<HashMap<CorrelationKey, ResultSlot>>>,
}

impl InMemoryCorrelationStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn finish(&self, key: &CorrelationKey, terminal: ResultSlot) -> Result<Transition> {
        let mut slots = self.slots.write().await;
        match slots.entry(key.clone()) {
            Entry::Occupied(entry) if entry.get().is_terminal() => Ok(Transition::AlreadyTerminal),
            Entry::Occupied(mut entry) => {
                entry.insert(terminal);
                Ok(Transition::Applied)
            }
            Entry::Vacant(entry) => {
                entry.insert(terminal);
                Ok(Transition::Applied)
            }
        }
    }
}

#[async_trait]
impl CorrelationStore for InMemoryCorrelationStore {
    async fn put_pending(&self, key: &CorrelationKey) -> Result<bool> {
        let mut slots = self.slots.write().await;
        match slots.entry(key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(ResultSlot::Pending);
                Ok(true)
            }
        }
    }

    async fn complete(&self, key: &CorrelationKey, result: SupplementResult) -> Result<Transition> {
        self.finish(key, ResultSlot::Complete(result)).await
    }

    async fn fail(&self, key: &CorrelationKey, reason: String) -> Result<Transition> {
        self.finish(key, ResultSlot::Failed { reason }).await
    }

    async fn get(&self, key: &str) -> Result<ResultSlot> {
        let slots = self.slots.read().await;
        Ok(slots.get(key).cloned().unwrap_or_default())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.slots.read().await.len())
    }
}
