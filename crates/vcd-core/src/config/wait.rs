//! Task-wait and busy-retry settings stored in profiles

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long and how often to poll VCD tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWaitConfig {
    /// Give up waiting after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between two polls, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for TaskWaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl TaskWaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Retry policy for deletions refused because the entity is busy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyRetryConfig {
    /// Whether busy deletions are retried at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Message fragment that marks a busy entity on servers that do not
    /// send the `BUSY_ENTITY` minor code
    #[serde(default = "default_busy_message")]
    pub message: String,
}

impl Default for BusyRetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
            message: default_busy_message(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_interval_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    6
}

fn default_delay_secs() -> u64 {
    10
}

pub(crate) fn default_busy_message() -> String {
    "is busy completing an operation".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let wait = TaskWaitConfig::default();
        assert_eq!(wait.timeout(), Duration::from_secs(600));
        assert_eq!(wait.interval(), Duration::from_millis(500));

        let retry = BusyRetryConfig::default();
        assert!(retry.enabled);
        assert_eq!(retry.max_attempts, 6);
        assert_eq!(retry.delay_secs, 10);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let wait: TaskWaitConfig = toml::from_str("timeout_secs = 30").unwrap();
        assert_eq!(wait.timeout_secs, 30);
        assert_eq!(wait.interval_ms, 500);

        let retry: BusyRetryConfig = toml::from_str("enabled = false").unwrap();
        assert!(!retry.enabled);
        assert_eq!(retry.message, "is busy completing an operation");
    }
}
