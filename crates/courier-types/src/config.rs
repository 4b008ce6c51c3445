//! Per-service configuration with validation.
//!
//! Each logical service is this configuration plus an operation table over
//! the one shared client/dispatcher implementation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration for one logical service's request/reply channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Queue the service's dispatcher consumes requests from.
    pub request_queue: String,

    /// Queue the dispatcher sends responses to and the client listens on.
    pub response_queue: String,

    /// Per-call timeout applied by `invoke` when the caller passes none.
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,

    /// How often the background sweep scans for orphaned registry entries.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Grace period after which an unfulfilled registry entry is swept.
    /// Must exceed the largest per-call timeout in use, so the sweep only
    /// ever collects entries whose caller is already gone.
    #[serde(with = "humantime_serde")]
    pub sweep_max_age: Duration,

    /// Upper bound on concurrently executing handlers in the dispatcher.
    pub max_concurrent_handlers: usize,

    /// Capacity of each in-memory queue before senders see backpressure.
    pub queue_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_queue: "courier.requests".into(),
            response_queue: "courier.responses".into(),
            default_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(10),
            sweep_max_age: Duration::from_secs(120),
            max_concurrent_handlers: 50,
            queue_capacity: 1000,
        }
    }
}

impl ServiceConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_queue.is_empty() {
            return Err(ConfigError::EmptyQueueName("request_queue"));
        }
        if self.response_queue.is_empty() {
            return Err(ConfigError::EmptyQueueName("response_queue"));
        }
        if self.request_queue == self.response_queue {
            return Err(ConfigError::SameQueue(self.request_queue.clone()));
        }
        if self.default_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("default_timeout cannot be 0"));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout("sweep_interval cannot be 0"));
        }
        if self.sweep_max_age < self.default_timeout {
            return Err(ConfigError::InvalidTimeout(
                "sweep_max_age must be >= default_timeout",
            ));
        }
        if self.max_concurrent_handlers == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_concurrent_handlers cannot be 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidLimit("queue_capacity cannot be 0"));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A queue name was empty.
    #[error("queue name for {0} is empty")]
    EmptyQueueName(&'static str),

    /// Request and response queues must differ, or the dispatcher would
    /// consume its own replies.
    #[error("request and response queues are both {0:?}")]
    SameQueue(String),

    /// A duration field was out of range.
    #[error("invalid timeout: {0}")]
    InvalidTimeout(&'static str),

    /// A numeric limit was out of range.
    #[error("invalid limit: {0}")]
    InvalidLimit(&'static str),
}
