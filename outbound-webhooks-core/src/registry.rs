//! Subscription registry

use crate::{Result, StorageProvider, Subscription, SubscriptionRequest, WebhookError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// One event name or an ordered list of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventQuery {
    /// A single event name
    One(String),
    /// Several event names, queried in order
    Many(Vec<String>),
}

impl EventQuery {
    /// The event names in query order
    pub fn names(&self) -> &[String] {
        match self {
            EventQuery::One(name) => std::slice::from_ref(name),
            EventQuery::Many(names) => names,
        }
    }
}

impl From<&str> for EventQuery {
    fn from(name: &str) -> Self {
        EventQuery::One(name.to_string())
    }
}

impl From<String> for EventQuery {
    fn from(name: String) -> Self {
        EventQuery::One(name)
    }
}

impl From<Vec<String>> for EventQuery {
    fn from(names: Vec<String>) -> Self {
        EventQuery::Many(names)
    }
}

impl From<Vec<&str>> for EventQuery {
    fn from(names: Vec<&str>) -> Self {
        EventQuery::Many(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for EventQuery {
    fn from(names: &[&str]) -> Self {
        EventQuery::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EventQuery {
    fn from(names: [&str; N]) -> Self {
        EventQuery::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Validates creation requests and answers queries over a storage provider
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn StorageProvider>,
}

impl SubscriptionRegistry {
    /// Create a registry over the given provider
    pub fn new(store: Arc<dyn StorageProvider>) -> Self {
        Self { store }
    }

    /// The underlying provider
    pub fn store(&self) -> &Arc<dyn StorageProvider> {
        &self.store
    }

    /// Validate a request, mint a subscription and persist it.
    ///
    /// Returns the record as re-read from the provider.
    pub async fn add(&self, request: SubscriptionRequest) -> Result<Subscription> {
        let subscription = request.into_subscription()?;
        let id = subscription.id.clone();

        self.store.add(subscription).await?;

        let stored = self.store.get_by_id(&id).await?.ok_or_else(|| {
            WebhookError::StorageWrite(format!("subscription {} missing after write", id))
        })?;

        info!(
            subscription_id = %stored.id,
            url = %stored.url,
            events = ?stored.events,
            "Subscription added"
        );
        Ok(stored)
    }

    /// Every stored subscription
    pub async fn get_all(&self) -> Result<Vec<Subscription>> {
        self.store.get_all().await
    }

    /// Look up a subscription by id
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        self.store.get_by_id(id).await
    }

    /// Subscriptions carrying the tag; `None` when there are none
    pub async fn get_by_tag(&self, tag: &str) -> Result<Option<Vec<Subscription>>> {
        Ok(self
            .store
            .get_by_tag(tag)
            .await?
            .filter(|subscriptions| !subscriptions.is_empty()))
    }

    /// Subscriptions matching any of the given events.
    ///
    /// Events are queried in the order given; each subscription appears once,
    /// at the position where it was first seen. `None` when nothing matches.
    pub async fn get_by_events(
        &self,
        events: impl Into<EventQuery>,
    ) -> Result<Option<Vec<Subscription>>> {
        let query = events.into();
        let mut seen = HashSet::new();
        let mut matched = Vec::new();

        for event in query.names() {
            let Some(results) = self.store.get_by_event(event).await? else {
                continue;
            };
            for subscription in results {
                if seen.insert(subscription.id.clone()) {
                    matched.push(subscription);
                }
            }
        }

        debug!(events = ?query.names(), count = matched.len(), "Queried subscriptions by event");

        if matched.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matched))
        }
    }

    /// Remove a subscription. Always reports `true`, whether or not it existed.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        self.store.remove(id).await?;
        info!(subscription_id = %id, "Subscription removed");
        Ok(true)
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry").finish_non_exhaustive()
    }
}
