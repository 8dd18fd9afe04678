//! Timeout and retry defaults

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;
use crate::error::ConfigError;

/// Timeout, retry and exponential backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Wrap each attempt in a timeout
    pub timeout_enabled: bool,

    /// Per-attempt timeout
    #[serde(with = "duration_millis")]
    pub timeout: Duration,

    /// Retry retryable failures
    pub retry_enabled: bool,

    /// Attempts after the first one
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,

    /// Upper bound for any single delay
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,

    /// Multiplier for each retry
    pub multiplier: f64,

    /// Jitter factor (0.0 to 1.0); each delay lands within ±jitter of its nominal value
    pub jitter: f64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_enabled: true,
            timeout: Duration::from_secs(30),
            retry_enabled: true,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.25,
        }
    }
}

impl ResilienceConfig {
    /// Reject values that would make backoff meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "resilience.multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::Invalid(format!(
                "resilience.jitter must be within 0.0..=1.0, got {}",
                self.jitter
            )));
        }
        if self.max_delay < self.base_delay {
            return Err(ConfigError::Invalid(
                "resilience.max_delay must not be below base_delay".to_string(),
            ));
        }
        if self.timeout_enabled && self.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "resilience.timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
