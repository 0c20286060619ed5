//! Retry and wait settings stored per profile

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for resilience patterns
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResilienceConfig {
    /// Retry configuration for transient provider errors
    #[serde(default)]
    pub retry: RetryConfig,

    /// Operation wait configuration
    #[serde(default)]
    pub wait: WaitConfig,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Whether retry is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of retries after the first attempt
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// How operations are polled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitConfig {
    /// Seconds between status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Give up after this many seconds; unset waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            timeout_secs: None,
        }
    }
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8000
}

fn default_poll_interval() -> u64 {
    2
}
