//! Event dispatch to matching subscriptions

use crate::notifier::{DeliveryFailure, DeliveryResponse};
use crate::payload::truncate_string;
use crate::{
    DeliveryEnvelope, DeliveryError, DeliveryNotifier, Notification, Result, StorageProvider,
    Subscription, TriggerSummary, WebhooksConfig,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, redirect};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Header carrying the subscription ID
pub const WEBHOOK_ID_HEADER: &str = "X-Webhook-Id";

/// Header carrying the event name
pub const WEBHOOK_EVENT_HEADER: &str = "X-Webhook-Event";

/// Resolves subscriptions for an event and fans out deliveries
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn StorageProvider>,
    http_client: Client,
    notifier: DeliveryNotifier,
    config: Arc<WebhooksConfig>,
}

impl Dispatcher {
    /// Create a dispatcher over a provider, reporting to `notifier`
    pub fn new(
        store: Arc<dyn StorageProvider>,
        notifier: DeliveryNotifier,
        config: WebhooksConfig,
    ) -> Result<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        if !config.verify_tls {
            warn!("TLS certificate verification is disabled for webhook deliveries");
        }

        Ok(Self {
            store,
            http_client,
            notifier,
            config: Arc::new(config),
        })
    }

    /// Trigger `event` for every subscription listing it.
    ///
    /// With `tag_filter`, only subscriptions carrying that tag are delivered
    /// to. Returns `None` when no subscription lists the event. Deliveries
    /// run in the background; their outcomes arrive on the notifier, possibly
    /// after this returns.
    pub async fn trigger_by_event(
        &self,
        event: &str,
        data: serde_json::Value,
        tag_filter: Option<&str>,
    ) -> Result<Option<TriggerSummary>> {
        let Some(mut subscriptions) = self.store.get_by_event(event).await? else {
            debug!(event = %event, "No subscriptions for event");
            return Ok(None);
        };
        if subscriptions.is_empty() {
            debug!(event = %event, "No subscriptions for event");
            return Ok(None);
        }

        if let Some(tag) = tag_filter {
            subscriptions.retain(|s| s.has_tag(tag));
        }

        let ids: Vec<String> = subscriptions.iter().map(|s| s.id.clone()).collect();
        for subscription in subscriptions {
            self.spawn_delivery(subscription, event, data.clone());
        }

        info!(event = %event, tag = ?tag_filter, count = ids.len(), "Triggered webhooks");
        Ok(Some(TriggerSummary::new(ids)))
    }

    /// Launch a delivery without waiting for it
    fn spawn_delivery(&self, subscription: Subscription, event: &str, data: serde_json::Value) {
        let delivery = Delivery {
            http_client: self.http_client.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        };
        let envelope = DeliveryEnvelope::new(event, subscription.id.clone(), data);
        tokio::spawn(async move {
            let notification = delivery.deliver(&subscription, envelope).await;
            delivery.notifier.emit(notification);
        });
    }

    /// The notifier deliveries report to
    pub fn notifier(&self) -> &DeliveryNotifier {
        &self.notifier
    }

    /// Get the configuration
    pub fn config(&self) -> &WebhooksConfig {
        &self.config
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Everything a background delivery task needs
struct Delivery {
    http_client: Client,
    notifier: DeliveryNotifier,
    config: Arc<WebhooksConfig>,
}

impl Delivery {
    /// Perform one POST and describe its outcome
    async fn deliver(&self, subscription: &Subscription, envelope: DeliveryEnvelope) -> Notification {
        let body = match envelope.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                return self.failure(subscription, envelope, DeliveryError::Serialization(e.to_string()));
            }
        };

        if body.len() > self.config.max_payload_size {
            let error = DeliveryError::PayloadTooLarge {
                size: body.len(),
                limit: self.config.max_payload_size,
            };
            return self.failure(subscription, envelope, error);
        }

        let mut request = self
            .http_client
            .post(&subscription.url)
            .header(CONTENT_TYPE, "application/json")
            .header(WEBHOOK_ID_HEADER, &subscription.id)
            .header(WEBHOOK_EVENT_HEADER, &envelope.event);

        if subscription.authentication {
            request = request.header(
                AUTHORIZATION,
                format!("{} {}", self.config.auth_scheme, subscription.auth_token),
            );
        }

        debug!(subscription_id = %subscription.id, event = %envelope.event, "Sending webhook");
        let started = Instant::now();

        let response = match request.body(body).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = DeliveryError::from_reqwest(&e, self.config.timeout);
                return self.failure(subscription, envelope, error);
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) if text.is_empty() => None,
            Ok(text) => Some(truncate_string(&text, self.config.max_response_body)),
            Err(e) => {
                let error = DeliveryError::from_reqwest(&e, self.config.timeout);
                return self.failure(subscription, envelope, error);
            }
        };
        let elapsed = started.elapsed();

        info!(
            subscription_id = %subscription.id,
            event = %envelope.event,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Webhook delivered"
        );

        Notification::Response(DeliveryResponse {
            message: format!("Webhook {} responded with HTTP {}", subscription.id, status),
            subscription_id: subscription.id.clone(),
            event: envelope.event,
            sent_at: envelope.webhook_sent_at,
            status,
            body,
            elapsed,
        })
    }

    fn failure(
        &self,
        subscription: &Subscription,
        envelope: DeliveryEnvelope,
        error: DeliveryError,
    ) -> Notification {
        warn!(
            subscription_id = %subscription.id,
            event = %envelope.event,
            error = %error,
            "Webhook delivery failed"
        );

        Notification::Error(DeliveryFailure {
            message: format!("Webhook {} delivery failed: {}", subscription.id, error),
            subscription_id: subscription.id.clone(),
            event: envelope.event,
            sent_at: envelope.webhook_sent_at,
            error,
        })
    }
}
