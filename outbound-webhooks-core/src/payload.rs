//! Delivery envelope and trigger summary types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The JSON body POSTed to a subscription URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEnvelope {
    /// Event name that was triggered
    pub event: String,

    /// ID of the subscription being delivered to
    pub webhook_id: String,

    /// When this delivery was sent
    pub webhook_sent_at: DateTime<Utc>,

    /// Caller payload, passed through unexamined
    pub data: serde_json::Value,
}

impl DeliveryEnvelope {
    /// Create an envelope stamped with the current time
    pub fn new(
        event: impl Into<String>,
        webhook_id: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event: event.into(),
            webhook_id: webhook_id.into(),
            webhook_sent_at: Utc::now(),
            data,
        }
    }

    /// Convert to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Informational result of a trigger call.
///
/// Reflects deliveries launched, not deliveries that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSummary {
    /// Human-readable count message
    pub message: String,

    /// Matched subscription IDs, in dispatch order
    pub subscription_ids: Vec<String>,
}

impl TriggerSummary {
    /// Build a summary for the given subscription IDs
    pub fn new(subscription_ids: Vec<String>) -> Self {
        Self {
            message: format!("Triggered {} webhook(s)", subscription_ids.len()),
            subscription_ids,
        }
    }

    /// Number of deliveries launched
    pub fn count(&self) -> usize {
        self.subscription_ids.len()
    }
}

/// Truncate a string to at most `max_len` bytes without splitting a character
pub(crate) fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    if max_len < 3 {
        return String::new();
    }

    let mut end = max_len - 3;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
