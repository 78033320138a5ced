use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::error::ConfigError;

/// Bridge runtime configuration. Every field has a default except `redis_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Connection string for the queue substrate.
    pub redis_url: Option<String>,
    /// Wallet-session project id (public).
    pub project_id: String,
    /// CAIP-2 network the bridge signs for.
    pub network: String,
    pub queues: QueueNames,
    pub timeouts: Timeouts,
    /// Methods granted when a proposal does not list any.
    pub default_methods: Vec<String>,
    /// Events granted when a proposal does not list any.
    pub default_events: Vec<String>,
    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            project_id: DEFAULT_PROJECT_ID.into(),
            network: DEFAULT_NETWORK.into(),
            queues: QueueNames::default(),
            timeouts: Timeouts::default(),
            default_methods: default_methods(),
            default_events: default_events(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn redis_url(&self) -> Result<&str, ConfigError> {
        self.redis_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("redis_url"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueNames {
    pub pairing_requests: String,
    pub status_events: String,
    pub signing_requests: String,
    /// Prefix of the per-call reply channel; the correlation id is appended.
    pub reply_prefix: String,
    pub wallet_commands: String,
    pub wallet_events: String,
    pub wallet_reply_prefix: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        Self {
            pairing_requests: DEFAULT_PAIRING_QUEUE.into(),
            status_events: DEFAULT_STATUS_QUEUE.into(),
            signing_requests: DEFAULT_SIGNING_QUEUE.into(),
            reply_prefix: DEFAULT_REPLY_PREFIX.into(),
            wallet_commands: DEFAULT_WALLET_COMMAND_QUEUE.into(),
            wallet_events: DEFAULT_WALLET_EVENT_QUEUE.into(),
            wallet_reply_prefix: DEFAULT_WALLET_REPLY_PREFIX.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub request_secs: u64,
    pub poll_tick_secs: u64,
    pub consumer_backoff_ms: u64,
    pub wallet_command_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_tick_secs: DEFAULT_POLL_TICK_SECS,
            consumer_backoff_ms: DEFAULT_CONSUMER_BACKOFF_MS,
            wallet_command_secs: DEFAULT_WALLET_COMMAND_TIMEOUT_SECS,
        }
    }
}

impl Timeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn poll_tick(&self) -> Duration {
        Duration::from_secs(self.poll_tick_secs)
    }

    pub fn consumer_backoff(&self) -> Duration {
        Duration::from_millis(self.consumer_backoff_ms)
    }

    pub fn wallet_command(&self) -> Duration {
        Duration::from_secs(self.wallet_command_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `signbridge_bridge=debug`.
    pub level: String,
    /// Directory for rolling NDJSON logs; console only when unset.
    pub dir: Option<PathBuf>,
    /// Emit console logs as JSON.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.into(),
            dir: None,
            json: false,
        }
    }
}
