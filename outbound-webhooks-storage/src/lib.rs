//! File-backed subscription storage for outbound webhooks
//!
//! Provides [`FileStorageProvider`], a [`StorageProvider`] that keeps every
//! subscription in a single JSON document and survives process restarts.
//!
//! # Document Layout
//!
//! ```json
//! {
//!   "webhooks": [
//!     {
//!       "id": "4f1c…",
//!       "url": "https://example.com/hook",
//!       "events": ["user.create"],
//!       "tags": [],
//!       "meta": {},
//!       "authentication": true,
//!       "authToken": "…",
//!       "created": "2024-01-01T00:00:00Z",
//!       "modified": "2024-01-01T00:00:00Z"
//!     }
//!   ]
//! }
//! ```
//!
//! The document is validated on load; a missing file or a missing
//! `webhooks` field loads as an empty store.
//!
//! # Quick Start
//!
//! ```no_run
//! use outbound_webhooks_core::Webhooks;
//! use outbound_webhooks_storage::FileStorageProvider;
//!
//! # async fn example() -> outbound_webhooks_core::Result<()> {
//! let store = FileStorageProvider::open("./data/webhooks.json").await?;
//! let webhooks = Webhooks::builder().storage(store).build()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`StorageProvider`]: outbound_webhooks_core::StorageProvider

pub mod file;

pub use file::*;
