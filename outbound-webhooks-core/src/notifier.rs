//! Delivery outcome notifications
//!
//! Every delivery attempt produces exactly one [`Notification`]: a
//! `Response` when the endpoint answered (any status code, including 4xx/5xx
//! and unfollowed redirects) or an `Error` when the transport failed.
//! Notifications are broadcast live to whoever is subscribed at the time;
//! late subscribers get no replay.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The two kinds of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// The endpoint returned a response
    Response,
    /// The transport failed before a response arrived
    Error,
}

impl NotificationKind {
    /// Name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Response => "response",
            NotificationKind::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a delivery produced no response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The delivery exceeded its timeout budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Could not connect (DNS, refused, TLS handshake)
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request could not be built or sent
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// The envelope exceeded the configured maximum
    #[error("Payload too large: {size} bytes (max: {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The envelope could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl DeliveryError {
    /// Classify a transport error from the HTTP client
    pub fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            DeliveryError::Timeout(timeout)
        } else if err.is_connect() {
            DeliveryError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            DeliveryError::Body(err.to_string())
        } else {
            DeliveryError::Request(err.to_string())
        }
    }
}

/// A delivery that reached its endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    /// Subscription delivered to
    pub subscription_id: String,
    /// Event name delivered
    pub event: String,
    /// When the delivery was sent
    pub sent_at: DateTime<Utc>,
    /// Human-readable summary
    pub message: String,
    /// HTTP status code
    pub status: u16,
    /// Response body, truncated
    pub body: Option<String>,
    /// Time from send to response
    pub elapsed: Duration,
}

/// A delivery that failed at the transport level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Subscription delivered to
    pub subscription_id: String,
    /// Event name delivered
    pub event: String,
    /// When the delivery was sent
    pub sent_at: DateTime<Utc>,
    /// Human-readable summary
    pub message: String,
    /// What went wrong
    pub error: DeliveryError,
}

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The endpoint answered
    Response(DeliveryResponse),
    /// The transport failed
    Error(DeliveryFailure),
}

impl Notification {
    /// Which kind of notification this is
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Response(_) => NotificationKind::Response,
            Notification::Error(_) => NotificationKind::Error,
        }
    }

    /// Subscription the delivery was for
    pub fn subscription_id(&self) -> &str {
        match self {
            Notification::Response(r) => &r.subscription_id,
            Notification::Error(e) => &e.subscription_id,
        }
    }

    /// Event name that was delivered
    pub fn event(&self) -> &str {
        match self {
            Notification::Response(r) => &r.event,
            Notification::Error(e) => &e.event,
        }
    }

    /// Human-readable summary
    pub fn message(&self) -> &str {
        match self {
            Notification::Response(r) => &r.message,
            Notification::Error(e) => &e.message,
        }
    }

    /// The response details, if the endpoint answered
    pub fn as_response(&self) -> Option<&DeliveryResponse> {
        match self {
            Notification::Response(r) => Some(r),
            Notification::Error(_) => None,
        }
    }

    /// The failure details, if the transport failed
    pub fn as_error(&self) -> Option<&DeliveryFailure> {
        match self {
            Notification::Error(e) => Some(e),
            Notification::Response(_) => None,
        }
    }
}

/// Broadcasts delivery outcomes to live subscribers.
///
/// Cheap to clone; clones share the same channel. Each engine owns its own
/// notifier, so separate engines in one process never see each other's
/// notifications.
#[derive(Debug, Clone)]
pub struct DeliveryNotifier {
    sender: broadcast::Sender<Notification>,
    capacity: usize,
}

impl DeliveryNotifier {
    /// Create a notifier buffering up to `capacity` notifications per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to every notification emitted from now on
    pub fn subscribe(&self) -> NotificationStream {
        NotificationStream {
            receiver: self.sender.subscribe(),
            kind: None,
        }
    }

    /// Run `handler` for every notification of `kind`.
    ///
    /// The listener is registered before this returns, so nothing emitted
    /// afterwards is missed. Requires a Tokio runtime.
    pub fn on<F>(&self, kind: NotificationKind, handler: F) -> NotificationListener
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        let mut stream = self.subscribe().kind(kind);
        let handle = tokio::spawn(async move {
            while let Some(notification) = stream.recv().await {
                handler(notification);
            }
        });
        debug!(kind = %kind, "Notification listener registered");
        NotificationListener { handle }
    }

    /// Run `handler` for every response notification
    pub fn on_response<F>(&self, handler: F) -> NotificationListener
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        self.on(NotificationKind::Response, handler)
    }

    /// Run `handler` for every error notification
    pub fn on_error<F>(&self, handler: F) -> NotificationListener
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        self.on(NotificationKind::Error, handler)
    }

    /// Deliver a notification to current subscribers.
    ///
    /// Returns how many subscribers received it; zero subscribers is not an error.
    pub fn emit(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber buffer size
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for DeliveryNotifier {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// A live feed of notifications
#[derive(Debug)]
pub struct NotificationStream {
    receiver: broadcast::Receiver<Notification>,
    kind: Option<NotificationKind>,
}

impl NotificationStream {
    /// Only yield notifications of the given kind
    pub fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Wait for the next notification.
    ///
    /// Returns `None` once every notifier handle has been dropped. If this
    /// subscriber fell behind, the missed notifications are skipped.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => {
                    if self.kind.is_none_or(|kind| kind == notification.kind()) {
                        return Some(notification);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification subscriber lagged, notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Handle to a listener started by [`DeliveryNotifier::on`].
///
/// The listener runs until the handle is cancelled or dropped.
#[derive(Debug)]
#[must_use = "dropping the handle stops the listener"]
pub struct NotificationListener {
    handle: JoinHandle<()>,
}

impl NotificationListener {
    /// Stop the listener
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Check if the listener has stopped
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
