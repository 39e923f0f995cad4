//! Bounded retry for deletions refused because the entity is busy
//!
//! VCD rejects some deletions while another task still holds the entity.
//! Newer servers say so with the `BUSY_ENTITY` minor error code, older ones
//! only in the message text. [`BusyTrigger`] recognises both.
//!
//! This is deliberately narrow: only errors the trigger matches are retried,
//! with a fixed delay and a fixed number of attempts.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::BusyRetryConfig;
use crate::config::wait::default_busy_message;
use crate::error::{BUSY_ENTITY_CODE, Operation, Result, VcdError};
use crate::task::sleep_or_cancel;

/// Decides whether an error means "entity busy, try again later"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyTrigger {
    code: String,
    message: String,
}

impl Default for BusyTrigger {
    fn default() -> Self {
        Self::new(default_busy_message())
    }
}

impl BusyTrigger {
    /// Match the `BUSY_ENTITY` code or a message containing `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: BUSY_ENTITY_CODE.to_string(),
            message: message.into(),
        }
    }

    pub fn matches(&self, err: &VcdError) -> bool {
        let VcdError::RequestFailed {
            detail, api_error, ..
        } = err
        else {
            return false;
        };

        if let Some(api) = api_error {
            if api.minor_error_code.as_deref() == Some(self.code.as_str()) {
                return true;
            }
            if api
                .message
                .as_deref()
                .is_some_and(|m| self.message_matches(m))
            {
                return true;
            }
        }
        self.message_matches(detail)
    }

    fn message_matches(&self, text: &str) -> bool {
        !self.message.is_empty() && text.contains(&self.message)
    }
}

/// Fixed-delay, bounded-attempt retry on busy errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyRetryPolicy {
    /// Total attempts including the first; 0 behaves like 1
    pub max_attempts: u32,
    pub delay: Duration,
    pub trigger: BusyTrigger,
}

impl Default for BusyRetryPolicy {
    fn default() -> Self {
        Self::from_config(&BusyRetryConfig::default())
    }
}

impl BusyRetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            trigger: BusyTrigger::default(),
        }
    }

    /// A policy that never retries
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &BusyRetryConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            max_attempts: config.max_attempts,
            delay: Duration::from_secs(config.delay_secs),
            trigger: BusyTrigger::new(config.message.clone()),
        }
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: BusyTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Run `attempt` until it succeeds, fails with a non-busy error, or the
    /// attempts run out (the last busy error is returned then)
    pub async fn run<F, Fut, T>(
        &self,
        operation: Operation,
        entity: &str,
        cancel: Option<&CancellationToken>,
        mut attempt: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(err) if tries < max_attempts && self.trigger.matches(&err) => {
                    warn!(
                        %operation,
                        entity,
                        attempt = tries,
                        max_attempts,
                        delay = ?self.delay,
                        "entity busy, retrying"
                    );
                    sleep_or_cancel(self.delay, cancel, operation, entity).await?;
                    tries += 1;
                }
                other => return other,
            }
        }
    }
}

impl VcdError {
    /// Returns true if the server refused the call because the entity is busy
    #[must_use]
    pub fn is_busy(&self) -> bool {
        BusyTrigger::default().matches(self)
    }
}
