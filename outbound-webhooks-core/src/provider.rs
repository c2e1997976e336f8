//! Storage provider contract
//!
//! Any backend implementing [`StorageProvider`] can be plugged into the
//! registry and dispatcher without changes to either.
//!
//! ```no_run
//! use async_trait::async_trait;
//! use outbound_webhooks_core::{Result, StorageProvider, Subscription};
//!
//! struct MyDatabase;
//!
//! #[async_trait]
//! impl StorageProvider for MyDatabase {
//!     async fn get_all(&self) -> Result<Vec<Subscription>> { Ok(vec![]) }
//!     async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> { Ok(None) }
//!     async fn get_by_event(&self, event: &str) -> Result<Option<Vec<Subscription>>> { Ok(None) }
//!     async fn get_by_tag(&self, tag: &str) -> Result<Option<Vec<Subscription>>> { Ok(None) }
//!     async fn add(&self, subscription: Subscription) -> Result<Subscription> { Ok(subscription) }
//!     async fn remove(&self, id: &str) -> Result<bool> { Ok(true) }
//! }
//! ```

use crate::{Result, Subscription};
use async_trait::async_trait;

/// Keeper of subscription records.
///
/// Implementations must tolerate concurrent calls and serialize their own
/// writes; the registry does no locking of its own.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Every stored subscription, in a stable order
    async fn get_all(&self) -> Result<Vec<Subscription>>;

    /// Look up one subscription; `None` when absent
    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>>;

    /// Subscriptions whose `events` contain `event` exactly; `None` when there are none
    async fn get_by_event(&self, event: &str) -> Result<Option<Vec<Subscription>>>;

    /// Subscriptions whose `tags` contain `tag` exactly; `None` when there are none
    async fn get_by_tag(&self, tag: &str) -> Result<Option<Vec<Subscription>>>;

    /// Persist a fully-formed subscription and return the stored record
    async fn add(&self, subscription: Subscription) -> Result<Subscription>;

    /// Delete by id. Idempotent: returns `true` whether or not it existed.
    async fn remove(&self, id: &str) -> Result<bool>;
}

/// Turn an empty match list into `None`, the absent marker used by query operations
pub fn non_empty(subscriptions: Vec<Subscription>) -> Option<Vec<Subscription>> {
    if subscriptions.is_empty() {
        None
    } else {
        Some(subscriptions)
    }
}
