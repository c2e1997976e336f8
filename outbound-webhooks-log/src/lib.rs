//! Logging setup for outbound webhooks
//!
//! The webhook crates log through `tracing`. This crate builds a
//! `tracing-subscriber` stack for applications that do not bring their own,
//! configured from environment variables.
//!
//! # Usage
//!
//! ```rust,no_run
//! outbound_webhooks_log::init();
//!
//! tracing::info!("webhook engine starting");
//! ```
//!
//! # Environment Variables
//!
//! - `WEBHOOKS_DEBUG=1` - Enable debug logging
//! - `WEBHOOKS_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `WEBHOOKS_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `WEBHOOKS_LOG_COLOR=1|0` - Enable/disable colors
//!
//! `RUST_LOG`, when set, takes precedence over the level.

use std::env;
use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level of events to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
    /// Off (no logging)
    Off,
}

impl Level {
    /// Directive understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ParseError::new("level", s)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human-oriented
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            _ => Err(ParseError::new("format", s)),
        }
    }
}

/// An unrecognized level or format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    what: &'static str,
    value: String,
}

impl ParseError {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log {}: {:?}", self.what, self.value)
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include the event target
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            color: false, // JSON output doesn't use colors
            target: true,
        }
    }
}

impl LogConfig {
    /// Create config from `WEBHOOKS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create config through an arbitrary key lookup.
    ///
    /// Unrecognized values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        };

        let debug = flag("WEBHOOKS_DEBUG").unwrap_or(false);

        let level = lookup("WEBHOOKS_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("WEBHOOKS_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Format::Json);

        let color = flag("WEBHOOKS_LOG_COLOR")
            .unwrap_or_else(|| format != Format::Json && std::io::stderr().is_terminal());

        Self {
            level,
            format,
            color,
            target: true,
        }
    }
}

// ============================================================================
// Subscriber
// ============================================================================

/// Build a subscriber from environment configuration.
pub fn subscriber() -> impl tracing::Subscriber + Send + Sync + 'static {
    subscriber_with(&LogConfig::from_env())
}

/// Build a subscriber from explicit configuration.
pub fn subscriber_with(config: &LogConfig) -> impl tracing::Subscriber + Send + Sync + 'static + use<> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        Format::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(config.target)
            .with_writer(std::io::stderr)
            .boxed(),
        Format::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(config.color)
            .with_target(config.target)
            .with_writer(std::io::stderr)
            .boxed(),
        Format::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(config.color)
            .with_target(config.target)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry().with(output).with(filter)
}

/// Install the environment-configured subscriber globally.
///
/// Does nothing if a global subscriber is already set.
pub fn init() {
    let _ = try_init();
}

/// Install the environment-configured subscriber globally.
pub fn try_init() -> Result<(), TryInitError> {
    subscriber().try_init()
}

// ============================================================================
// Tests
// ============================================================================
