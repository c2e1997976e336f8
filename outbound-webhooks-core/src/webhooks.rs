//! The webhooks engine: registry, dispatcher and notifier over one store

use crate::registry::EventQuery;
use crate::{
    DeliveryNotifier, Dispatcher, MemoryStorageProvider, NotificationKind, NotificationListener,
    NotificationStream, Notification, Result, StorageProvider, Subscription,
    SubscriptionRegistry, SubscriptionRequest, TriggerSummary, WebhooksConfig,
};
use std::sync::Arc;

/// Registry and dispatch engine for outbound webhooks
///
/// Each instance owns its own notifier; two engines in one process never
/// see each other's delivery outcomes.
#[derive(Debug, Clone)]
pub struct Webhooks {
    registry: SubscriptionRegistry,
    dispatcher: Dispatcher,
}

impl Webhooks {
    /// Create an engine backed by in-memory storage and default config
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for custom storage or configuration
    pub fn builder() -> WebhooksBuilder {
        WebhooksBuilder::new()
    }

    /// Validate and store a new subscription
    pub async fn add(&self, request: SubscriptionRequest) -> Result<Subscription> {
        self.registry.add(request).await
    }

    /// Every stored subscription
    pub async fn get_all(&self) -> Result<Vec<Subscription>> {
        self.registry.get_all().await
    }

    /// Look up a subscription by id
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        self.registry.get_by_id(id).await
    }

    /// Subscriptions carrying the tag
    pub async fn get_by_tag(&self, tag: &str) -> Result<Option<Vec<Subscription>>> {
        self.registry.get_by_tag(tag).await
    }

    /// Subscriptions matching one or more events, deduplicated by id
    pub async fn get_by_events(
        &self,
        events: impl Into<EventQuery>,
    ) -> Result<Option<Vec<Subscription>>> {
        self.registry.get_by_events(events).await
    }

    /// Remove a subscription; always `true`
    pub async fn remove(&self, id: &str) -> Result<bool> {
        self.registry.remove(id).await
    }

    /// Deliver `data` to every subscription listing `event`
    pub async fn trigger_by_event(
        &self,
        event: &str,
        data: serde_json::Value,
        tag_filter: Option<&str>,
    ) -> Result<Option<TriggerSummary>> {
        self.dispatcher.trigger_by_event(event, data, tag_filter).await
    }

    /// Run `handler` for each delivery outcome of `kind`
    pub fn on_notification<F>(&self, kind: NotificationKind, handler: F) -> NotificationListener
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        self.notifier().on(kind, handler)
    }

    /// Subscribe to delivery outcomes
    pub fn notifications(&self) -> NotificationStream {
        self.notifier().subscribe()
    }

    /// The subscription registry
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// The dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The delivery notifier
    pub fn notifier(&self) -> &DeliveryNotifier {
        self.dispatcher.notifier()
    }
}

/// Builder for [`Webhooks`]
#[derive(Default)]
pub struct WebhooksBuilder {
    store: Option<Arc<dyn StorageProvider>>,
    config: WebhooksConfig,
}

impl WebhooksBuilder {
    /// Create a builder with in-memory storage and default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given storage provider
    pub fn storage<S: StorageProvider + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Use an already shared storage provider
    pub fn shared_storage(mut self, store: Arc<dyn StorageProvider>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use the given configuration
    pub fn config(mut self, config: WebhooksConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Webhooks> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStorageProvider::new()));
        let notifier = DeliveryNotifier::new(self.config.notification_capacity);
        let dispatcher = Dispatcher::new(store.clone(), notifier, self.config)?;

        Ok(Webhooks {
            registry: SubscriptionRegistry::new(store),
            dispatcher,
        })
    }
}
