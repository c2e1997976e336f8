//! Outbound Webhooks
//!
//! A registry-and-dispatch engine for outbound webhooks. Clients register
//! subscriptions (a target URL, event names, optional tags and metadata) and
//! later trigger an event; every matching subscription receives an HTTP POST.
//!
//! # Features
//!
//! - **Subscription Registry**: Validated creation, lookup by id, event(s) or tag
//! - **Pluggable Storage**: Any backend implementing [`StorageProvider`]
//! - **Fire-and-forget Dispatch**: Deliveries run concurrently in the background
//! - **Delivery Notifications**: Per-delivery outcomes on a broadcast stream
//! - **Authenticated Deliveries**: `Authorization: WH <token>` with server-minted tokens
//!
//! Delivery failures are only visible through notifications. A caller that
//! never subscribes will not see them.
//!
//! # Example
//!
//! ```rust,no_run
//! use outbound_webhooks_core::{NotificationKind, SubscriptionRequest, Webhooks};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let webhooks = Webhooks::new()?;
//!
//!     let _listener = webhooks.on_notification(NotificationKind::Error, |n| {
//!         eprintln!("{}", n.message());
//!     });
//!
//!     webhooks
//!         .add(
//!             SubscriptionRequest::new("https://example.com/webhook")
//!                 .with_events(["user.create", "user.update"])
//!                 .with_tags(["billing"]),
//!         )
//!         .await?;
//!
//!     let summary = webhooks
//!         .trigger_by_event("user.create", serde_json::json!({"userId": "u1"}), None)
//!         .await?;
//!     println!("{:?}", summary);
//!     Ok(())
//! }
//! ```

mod config;
mod dispatcher;
mod error;
mod memory;
mod notifier;
mod payload;
mod provider;
mod registry;
mod subscription;
mod webhooks;

pub use config::{ENV_PREFIX, WebhooksConfig, WebhooksConfigBuilder};
pub use dispatcher::{Dispatcher, WEBHOOK_EVENT_HEADER, WEBHOOK_ID_HEADER};
pub use error::WebhookError;
pub use memory::MemoryStorageProvider;
pub use notifier::{
    DeliveryError, DeliveryFailure, DeliveryNotifier, DeliveryResponse, Notification,
    NotificationKind, NotificationListener, NotificationStream,
};
pub use payload::{DeliveryEnvelope, TriggerSummary};
pub use provider::{StorageProvider, non_empty};
pub use registry::{EventQuery, SubscriptionRegistry};
pub use subscription::{Subscription, SubscriptionRequest, generate_auth_token};
pub use webhooks::{Webhooks, WebhooksBuilder};

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
