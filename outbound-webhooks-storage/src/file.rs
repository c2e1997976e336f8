//! JSON file storage provider.

use async_trait::async_trait;
use outbound_webhooks_core::{Result, StorageProvider, Subscription, WebhookError, non_empty};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Directory created under the user config directory by [`FileStorageProvider::open_default`].
pub const DEFAULT_DIRECTORY: &str = "outbound-webhooks";

/// File name used by [`FileStorageProvider::open_default`].
pub const DEFAULT_FILE_NAME: &str = "webhooks.json";

/// On-disk layout: a single object holding every subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Stored subscriptions; an absent field loads as empty.
    #[serde(default)]
    pub webhooks: Vec<Subscription>,
}

#[derive(Serialize)]
struct StoreDocumentRef<'a> {
    webhooks: &'a [Subscription],
}

/// File storage configuration.
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    /// Path of the JSON document.
    pub path: PathBuf,
    /// Create parent directories if they don't exist.
    pub create_directories: bool,
    /// Write indented JSON.
    pub pretty: bool,
}

impl FileStorageConfig {
    /// Create configuration for a document path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_directories: true,
            pretty: true,
        }
    }

    /// Write compact JSON instead of indented.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Fail instead of creating missing parent directories.
    pub fn without_create_directories(mut self) -> Self {
        self.create_directories = false;
        self
    }
}

/// Subscription storage that survives process restarts.
///
/// The document is loaded and validated once at open; reads are served from
/// the loaded snapshot. Every write holds the store's write lock across the
/// whole read-modify-write, including the file replacement, so concurrent
/// writers within one process never lose updates. The snapshot only changes
/// after the new document is on disk.
#[derive(Debug)]
pub struct FileStorageProvider {
    config: FileStorageConfig,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl FileStorageProvider {
    /// Open (or create) the store described by `config`.
    pub async fn new(config: FileStorageConfig) -> Result<Self> {
        if config.create_directories
            && let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                WebhookError::Storage(format!(
                    "Failed to create storage directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        let subscriptions = load_document(&config.path).await?;
        info!(path = ?config.path, count = subscriptions.len(), "Opened file storage");

        Ok(Self {
            config,
            subscriptions: RwLock::new(subscriptions),
        })
    }

    /// Open the store at `path` with default settings.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(FileStorageConfig::new(path)).await
    }

    /// Open the per-user store under the platform config directory.
    pub async fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?).await
    }

    /// Location used by [`open_default`](Self::open_default).
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            WebhookError::ConfigError("no user config directory on this platform".to_string())
        })?;
        Ok(base.join(DEFAULT_DIRECTORY).join(DEFAULT_FILE_NAME))
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Re-read the document from disk, replacing the in-memory snapshot.
    ///
    /// Returns the number of subscriptions loaded.
    pub async fn reload(&self) -> Result<usize> {
        let mut subscriptions = self.subscriptions.write().await;
        *subscriptions = load_document(&self.config.path).await?;
        debug!(path = ?self.config.path, count = subscriptions.len(), "Reloaded file storage");
        Ok(subscriptions.len())
    }

    /// Replace the document on disk with `subscriptions`.
    ///
    /// Writes a sibling temp file and renames it over the document.
    async fn persist(&self, subscriptions: &[Subscription]) -> Result<()> {
        let document = StoreDocumentRef {
            webhooks: subscriptions,
        };
        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };

        let temp_path = self.temp_path();
        fs::write(&temp_path, &bytes).await.map_err(|e| {
            WebhookError::StorageWrite(format!("Failed to write {:?}: {}", temp_path, e))
        })?;

        if let Err(e) = fs::rename(&temp_path, &self.config.path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!(path = ?temp_path, error = %cleanup, "Failed to remove temp file");
            }
            return Err(WebhookError::StorageWrite(format!(
                "Failed to replace {:?}: {}",
                self.config.path, e
            )));
        }

        debug!(path = ?self.config.path, count = subscriptions.len(), "Persisted subscriptions");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .config
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        self.config
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()))
    }

    async fn filter<F>(&self, predicate: F) -> Vec<Subscription>
    where
        F: Fn(&Subscription) -> bool,
    {
        self.subscriptions
            .read()
            .await
            .iter()
            .filter(|s| predicate(s))
            .cloned()
            .collect()
    }
}

/// Load and validate the document at `path`; a missing or blank file is empty.
async fn load_document(path: &Path) -> Result<Vec<Subscription>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let document: StoreDocument = serde_json::from_slice(&bytes).map_err(|e| {
        WebhookError::Storage(format!("Invalid store document {:?}: {}", path, e))
    })?;

    let mut ids = HashSet::new();
    for subscription in document.webhooks.iter() {
        if subscription.id.is_empty() {
            return Err(WebhookError::Storage(format!(
                "Invalid store document {:?}: subscription without id",
                path
            )));
        }
        if subscription.events.is_empty() {
            return Err(WebhookError::Storage(format!(
                "Invalid store document {:?}: subscription {} has no events",
                path, subscription.id
            )));
        }
        if !ids.insert(subscription.id.clone()) {
            return Err(WebhookError::Storage(format!(
                "Invalid store document {:?}: duplicate subscription {}",
                path, subscription.id
            )));
        }
    }

    Ok(document.webhooks)
}

#[async_trait]
impl StorageProvider for FileStorageProvider {
    async fn get_all(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.read().await.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn get_by_event(&self, event: &str) -> Result<Option<Vec<Subscription>>> {
        Ok(non_empty(self.filter(|s| s.matches_event(event)).await))
    }

    async fn get_by_tag(&self, tag: &str) -> Result<Option<Vec<Subscription>>> {
        Ok(non_empty(self.filter(|s| s.has_tag(tag)).await))
    }

    async fn add(&self, subscription: Subscription) -> Result<Subscription> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.iter().any(|s| s.id == subscription.id) {
            return Err(WebhookError::StorageWrite(format!(
                "subscription {} already exists",
                subscription.id
            )));
        }

        let mut updated = subscriptions.clone();
        updated.push(subscription.clone());
        self.persist(&updated).await?;
        *subscriptions = updated;

        debug!(subscription_id = %subscription.id, "Stored subscription on disk");
        Ok(subscription)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        if !subscriptions.iter().any(|s| s.id == id) {
            return Ok(true);
        }

        let updated: Vec<Subscription> = subscriptions
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect();
        self.persist(&updated).await?;
        *subscriptions = updated;

        debug!(subscription_id = %id, "Removed subscription from disk");
        Ok(true)
    }
}
