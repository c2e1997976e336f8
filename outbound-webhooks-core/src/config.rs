//! Configuration for the webhooks engine

use crate::{Result, WebhookError};
use std::time::Duration;

/// Prefix for environment variables read by [`WebhooksConfig::from_env`]
pub const ENV_PREFIX: &str = "WEBHOOKS";

/// Configuration for the webhooks engine
#[derive(Debug, Clone)]
pub struct WebhooksConfig {
    /// Timeout budget for each delivery
    pub timeout: Duration,

    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Whether to verify TLS certificates
    pub verify_tls: bool,

    /// Scheme placed before the auth token in the Authorization header
    pub auth_scheme: String,

    /// Maximum serialized envelope size in bytes
    pub max_payload_size: usize,

    /// Response body bytes kept in a response notification
    pub max_response_body: usize,

    /// Buffered notifications per subscriber before it starts lagging
    pub notification_capacity: usize,
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("Outbound-Webhooks/{}", env!("CARGO_PKG_VERSION")),
            verify_tls: true,
            auth_scheme: "WH".to_string(),
            max_payload_size: 1024 * 1024, // 1MB
            max_response_body: 1024,
            notification_capacity: 1024,
        }
    }
}

impl WebhooksConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> WebhooksConfigBuilder {
        WebhooksConfigBuilder::new()
    }

    /// Load configuration from `WEBHOOKS_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Keys are the full variable names, e.g. `WEBHOOKS_TIMEOUT_SECS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(format!("{}_{}", ENV_PREFIX, name).as_str());
        let mut config = Self::default();

        if let Some(secs) = var("TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number(&secs, "TIMEOUT_SECS")?);
        }
        if let Some(agent) = var("USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(verify) = var("VERIFY_TLS") {
            config.verify_tls = parse_bool(&verify, "VERIFY_TLS")?;
        }
        if let Some(scheme) = var("AUTH_SCHEME") {
            config.auth_scheme = scheme;
        }
        if let Some(size) = var("MAX_PAYLOAD_SIZE") {
            config.max_payload_size = parse_number(&size, "MAX_PAYLOAD_SIZE")?;
        }
        if let Some(size) = var("MAX_RESPONSE_BODY") {
            config.max_response_body = parse_number(&size, "MAX_RESPONSE_BODY")?;
        }
        if let Some(capacity) = var("NOTIFICATION_CAPACITY") {
            config.notification_capacity = parse_number(&capacity, "NOTIFICATION_CAPACITY")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the engine unusable
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(WebhookError::ConfigError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(WebhookError::ConfigError(
                "notification_capacity must be greater than zero".to_string(),
            ));
        }
        if self.auth_scheme.trim().is_empty() {
            return Err(WebhookError::ConfigError(
                "auth_scheme must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        WebhookError::ConfigError(format!(
            "{}_{} must be a non-negative integer, got {:?}",
            ENV_PREFIX, name, value
        ))
    })
}

fn parse_bool(value: &str, name: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WebhookError::ConfigError(format!(
            "{}_{} must be a boolean, got {:?}",
            ENV_PREFIX, name, value
        ))),
    }
}

/// Builder for WebhooksConfig
#[derive(Debug, Clone, Default)]
pub struct WebhooksConfigBuilder {
    config: WebhooksConfig,
}

impl WebhooksConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: WebhooksConfig::default(),
        }
    }

    /// Set the per-delivery timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set TLS certificate verification.
    ///
    /// Disabling verification accepts any certificate, including
    /// self-signed and expired ones.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.verify_tls = verify;
        self
    }

    /// Set the Authorization header scheme
    pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.auth_scheme = scheme.into();
        self
    }

    /// Set maximum payload size
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set how much of a response body is kept in notifications
    pub fn max_response_body(mut self, size: usize) -> Self {
        self.config.max_response_body = size;
        self
    }

    /// Set the notification buffer capacity
    pub fn notification_capacity(mut self, capacity: usize) -> Self {
        self.config.notification_capacity = capacity;
        self
    }

    /// Build the configuration
    pub fn build(self) -> WebhooksConfig {
        self.config
    }
}
