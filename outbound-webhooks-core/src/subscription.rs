//! Subscription records and creation requests

use crate::{Result, WebhookError};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// A stored webhook subscription
///
/// Created only through [`SubscriptionRequest::into_subscription`], which mints
/// the `id` and `auth_token`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Unique subscription ID
    pub id: String,

    /// Target URL for deliveries
    pub url: String,

    /// Event names this subscription matches
    pub events: Vec<String>,

    /// Labels used to narrow a trigger
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creator-supplied metadata, returned verbatim
    #[serde(default)]
    pub meta: Map<String, Value>,

    /// Whether deliveries carry the Authorization header
    pub authentication: bool,

    /// Bearer value sent when `authentication` is set
    pub auth_token: String,

    /// Created timestamp
    pub created: DateTime<Utc>,

    /// Last modification timestamp
    pub modified: DateTime<Utc>,
}

impl Subscription {
    /// Check if this subscription lists the event (exact match)
    pub fn matches_event(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }

    /// Check if this subscription carries the tag (exact match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("events", &self.events)
            .field("tags", &self.tags)
            .field("meta", &self.meta)
            .field("authentication", &self.authentication)
            .field("auth_token", &"<redacted>")
            .field("created", &self.created)
            .field("modified", &self.modified)
            .finish()
    }
}

/// A request to create a subscription
///
/// Every field is optional at the type level so that untyped input can be
/// validated in one place; `url` and `events` are required by
/// [`validate`](Self::validate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Target URL
    #[serde(default)]
    pub url: Option<String>,

    /// Event names to subscribe to
    #[serde(default)]
    pub events: Option<Vec<String>>,

    /// Optional tags
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Optional metadata object
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,

    /// Whether to authenticate deliveries; `true` when unspecified
    #[serde(default)]
    pub authentication: Option<bool>,
}

impl SubscriptionRequest {
    /// Create a request for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Parse a request from untyped JSON.
    ///
    /// Fields of the wrong type fail with [`WebhookError::Validation`].
    /// Unknown fields (including any caller-supplied `id` or `authToken`)
    /// are ignored.
    pub fn from_json(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(WebhookError::validation(
                "subscription request must be a JSON object",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| WebhookError::validation(format!("malformed subscription request: {}", e)))
    }

    /// Set the events to subscribe to
    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Set the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Set the metadata object
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Enable or disable the Authorization header
    pub fn with_authentication(mut self, authentication: bool) -> Self {
        self.authentication = Some(authentication);
        self
    }

    /// Check that the request describes a usable subscription
    pub fn validate(&self) -> Result<()> {
        let url = match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => return Err(WebhookError::validation("missing url")),
        };

        let parsed = url::Url::parse(url)
            .map_err(|e| WebhookError::validation(format!("invalid url {:?}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WebhookError::validation(format!(
                "unsupported url scheme {:?}",
                parsed.scheme()
            )));
        }

        match &self.events {
            None => return Err(WebhookError::validation("missing events")),
            Some(events) if events.is_empty() => {
                return Err(WebhookError::validation("events requires at least one event"));
            }
            Some(events) => {
                if events.iter().any(|e| e.trim().is_empty()) {
                    return Err(WebhookError::validation("event names must not be blank"));
                }
            }
        }

        Ok(())
    }

    /// Validate the request and mint a new subscription from it.
    ///
    /// Assigns a fresh id and auth token and stamps `created`/`modified`.
    pub fn into_subscription(self) -> Result<Subscription> {
        self.validate()?;

        let now = Utc::now();
        Ok(Subscription {
            id: Uuid::new_v4().to_string(),
            url: self.url.unwrap_or_default(),
            events: dedup_preserving_order(self.events.unwrap_or_default()),
            tags: dedup_preserving_order(self.tags.unwrap_or_default()),
            meta: self.meta.unwrap_or_default(),
            authentication: self.authentication.unwrap_or(true),
            auth_token: generate_auth_token(),
            created: now,
            modified: now,
        })
    }
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Generate a fresh auth token.
///
/// 32 bytes from the OS-seeded CSPRNG, hashed with SHA-256 and hex-encoded.
pub fn generate_auth_token() -> String {
    let mut rng = rand::rng();
    let seed: [u8; 32] = rng.random();
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_subscription_defaults() {
        let sub = SubscriptionRequest::new("https://example.com/hook")
            .with_events(["user.create"])
            .into_subscription()
            .unwrap();

        assert!(!sub.id.is_empty());
        assert_eq!(sub.url, "https://example.com/hook");
        assert_eq!(sub.events, vec!["user.create"]);
        assert!(sub.tags.is_empty());
        assert!(sub.meta.is_empty());
        assert!(sub.authentication);
        assert_eq!(sub.auth_token.len(), 64);
        assert_eq!(sub.created, sub.modified);
    }

    #[test]
    fn test_explicit_authentication_false_is_kept() {
        let sub = SubscriptionRequest::new("https://example.com/hook")
            .with_events(["a"])
            .with_authentication(false)
            .into_subscription()
            .unwrap();

        assert!(!sub.authentication);
    }

    #[test]
    fn test_missing_url() {
        let err = SubscriptionRequest::default()
            .with_events(["a"])
            .into_subscription()
            .unwrap_err();
        assert!(err.is_validation());

        let err = SubscriptionRequest::new("   ")
            .with_events(["a"])
            .into_subscription()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_bad_url() {
        assert!(
            SubscriptionRequest::new("not a url")
                .with_events(["a"])
                .validate()
                .is_err()
        );
        assert!(
            SubscriptionRequest::new("ftp://example.com/hook")
                .with_events(["a"])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_url_is_stored_as_given() {
        let sub = SubscriptionRequest::new(" https://e.test/h ")
            .with_events(["e"])
            .into_subscription()
            .unwrap();
        assert_eq!(sub.url, " https://e.test/h ");
    }

    #[test]
    fn test_missing_or_empty_events() {
        let err = SubscriptionRequest::new("https://example.com")
            .validate()
            .unwrap_err();
        assert!(err.is_validation());

        let err = SubscriptionRequest::new("https://example.com")
            .with_events(Vec::<String>::new())
            .validate()
            .unwrap_err();
        assert!(err.is_validation());

        let err = SubscriptionRequest::new("https://example.com")
            .with_events(["ok", " "])
            .validate()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_duplicates_collapse_in_order() {
        let sub = SubscriptionRequest::new("https://example.com")
            .with_events(["b", "a", "b"])
            .with_tags(["x", "x", "y"])
            .into_subscription()
            .unwrap();

        assert_eq!(sub.events, vec!["b", "a"]);
        assert_eq!(sub.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_from_json_wrong_types() {
        let err = SubscriptionRequest::from_json(json!({
            "url": "https://example.com",
            "events": "user.create"
        }))
        .unwrap_err();
        assert!(err.is_validation());

        let err = SubscriptionRequest::from_json(json!({
            "url": "https://example.com",
            "events": ["a"],
            "meta": [1, 2]
        }))
        .unwrap_err();
        assert!(err.is_validation());

        let err = SubscriptionRequest::from_json(json!(["nope"])).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_json_ignores_supplied_token() {
        let request = SubscriptionRequest::from_json(json!({
            "url": "https://example.com",
            "events": ["a"],
            "id": "mine",
            "authToken": "chosen-by-caller"
        }))
        .unwrap();

        let sub = request.into_subscription().unwrap();
        assert_ne!(sub.id, "mine");
        assert_ne!(sub.auth_token, "chosen-by-caller");
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_auth_token();
        let b = generate_auth_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_debug_redacts_token() {
        let sub = SubscriptionRequest::new("https://example.com")
            .with_events(["a"])
            .into_subscription()
            .unwrap();

        let rendered = format!("{:?}", sub);
        assert!(!rendered.contains(&sub.auth_token));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_serialized_field_names() {
        let sub = SubscriptionRequest::new("https://example.com")
            .with_events(["a"])
            .into_subscription()
            .unwrap();

        let value = serde_json::to_value(&sub).unwrap();
        assert!(value.get("authToken").is_some());
        assert!(value.get("created").is_some());
        assert!(value.get("modified").is_some());
    }

    #[test]
    fn test_matching_helpers() {
        let sub = SubscriptionRequest::new("https://example.com")
            .with_events(["user.create"])
            .with_tags(["A"])
            .into_subscription()
            .unwrap();

        assert!(sub.matches_event("user.create"));
        assert!(!sub.matches_event("user.*"));
        assert!(sub.has_tag("A"));
        assert!(!sub.has_tag("a"));
    }
}
