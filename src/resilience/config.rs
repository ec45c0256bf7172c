//! # Circuit Breaker Configuration
//!
//! Thresholds and recovery timeout for a single circuit breaker. File-backed
//! settings live in `crate::config` and convert into this type.

use crate::config::{ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of failures recorded while closed before the circuit opens
    pub failure_threshold: u32,

    /// Number of successful probes in half-open state to close the circuit
    pub success_threshold: u32,

    /// Minimum time the circuit stays open before a probe is allowed
    pub reset_timeout: Duration,
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, success_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            success_threshold,
            reset_timeout,
        }
    }

    /// Create configuration for database operations
    pub fn for_database() -> Self {
        Self::new(5, 2, Duration::from_secs(30))
    }

    /// Create configuration for queue operations
    pub fn for_queue() -> Self {
        Self::new(3, 2, Duration::from_secs(15))
    }

    /// Create configuration for external API calls
    pub fn for_external_api() -> Self {
        Self::new(5, 2, Duration::from_secs(45))
    }

    /// Validate configuration parameters.
    ///
    /// A zero `reset_timeout` is accepted: the circuit then allows a probe on
    /// the first call after opening.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "failure_threshold",
                "0",
                "failure_threshold must be greater than 0",
            ));
        }

        if self.success_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "success_threshold",
                "0",
                "success_threshold must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::new(5, 2, Duration::from_secs(30))
    }
}
