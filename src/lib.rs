// Outbound Webhooks - subscription registry and event dispatch for Rust
//
// This library lets an application register HTTP endpoints against named
// events and fan event payloads out to them, reporting each delivery outcome
// through a notification channel.

// Re-export core functionality
pub use outbound_webhooks_core::*;

// Re-export optional crates
#[cfg(feature = "file-storage")]
pub use outbound_webhooks_storage;

#[cfg(feature = "log")]
pub use outbound_webhooks_log;

/// Prelude module for convenient imports
pub mod prelude {
    pub use outbound_webhooks_core::{
        DeliveryError, DeliveryFailure, DeliveryResponse, EventQuery, MemoryStorageProvider,
        Notification, NotificationKind, NotificationListener, NotificationStream,
        StorageProvider, Subscription, SubscriptionRequest, TriggerSummary, WebhookError,
        Webhooks, WebhooksConfig,
    };

    #[cfg(feature = "file-storage")]
    pub use outbound_webhooks_storage::{FileStorageConfig, FileStorageProvider};

    // Re-export commonly used external types
    pub use serde_json::{Value, json};
}
