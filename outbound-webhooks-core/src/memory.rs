//! In-memory storage provider

use crate::provider::non_empty;
use crate::{Result, StorageProvider, Subscription, WebhookError};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

/// Process-lifetime storage, for tests and ephemeral use.
///
/// Records are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStorageProvider {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl MemoryStorageProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions
    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }

    fn filter<F>(&self, predicate: F) -> Vec<Subscription>
    where
        F: Fn(&Subscription) -> bool,
    {
        self.subscriptions
            .read()
            .iter()
            .filter(|s| predicate(s))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    async fn get_all(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.read().clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn get_by_event(&self, event: &str) -> Result<Option<Vec<Subscription>>> {
        Ok(non_empty(self.filter(|s| s.matches_event(event))))
    }

    async fn get_by_tag(&self, tag: &str) -> Result<Option<Vec<Subscription>>> {
        Ok(non_empty(self.filter(|s| s.has_tag(tag))))
    }

    async fn add(&self, subscription: Subscription) -> Result<Subscription> {
        let mut subscriptions = self.subscriptions.write();
        if subscriptions.iter().any(|s| s.id == subscription.id) {
            return Err(WebhookError::StorageWrite(format!(
                "subscription {} already exists",
                subscription.id
            )));
        }
        debug!(subscription_id = %subscription.id, "Stored subscription in memory");
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        self.subscriptions.write().retain(|s| s.id != id);
        Ok(true)
    }
}
