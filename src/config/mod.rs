//! # Circuit Breaker Settings
//!
//! File and environment backed settings for the breakers a process creates.
//!
//! ## Architecture
//!
//! - **Base file**: `circuit_breaker.toml` in the config directory
//! - **Environment Awareness**: optional `circuit_breaker.<env>.toml` override
//! - **Variable Overrides**: `ATOMIC_CIRCUIT__*` environment variables win last
//! - **Explicit Validation**: settings are validated before they are returned
//!
//! ## Usage
//!
//! ```rust,no_run
//! use atomic_circuit::config::SettingsLoader;
//! use atomic_circuit::resilience::CircuitBreakerManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsLoader::from_env().load()?;
//! let manager = CircuitBreakerManager::from_settings(settings);
//! let breaker = manager.get_circuit_breaker("payments_api")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::SettingsLoader;

/// Thresholds for one component as written in settings files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl ComponentBreakerConfig {
    /// Convert to resilience module's format
    pub fn to_resilience_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new(
            self.failure_threshold,
            self.success_threshold,
            Duration::from_millis(self.reset_timeout_ms),
        )
    }
}

impl Default for ComponentBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
        }
    }
}

/// Circuit breaker settings for a whole process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Soft limit; exceeding it is logged, not refused
    pub max_circuit_breakers: usize,

    /// Configuration for components without an explicit entry
    pub default_config: ComponentBreakerConfig,

    /// Specific configurations for named components
    pub component_configs: HashMap<String, ComponentBreakerConfig>,
}

impl CircuitBreakerSettings {
    /// Get configuration for a specific component
    pub fn config_for_component(&self, component_name: &str) -> ComponentBreakerConfig {
        self.component_configs
            .get(component_name)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }

    /// Validate the default and every component entry.
    ///
    /// All problems are reported together in one `ValidationError`.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut problems = Vec::new();

        if self.max_circuit_breakers == 0 {
            problems.push("max_circuit_breakers must be greater than 0".to_string());
        }

        if let Err(e) = self.default_config.to_resilience_config().validate() {
            problems.push(format!("default_config: {e}"));
        }

        let mut names: Vec<&String> = self.component_configs.keys().collect();
        names.sort();
        for name in names {
            if let Err(e) = self.component_configs[name].to_resilience_config().validate() {
                problems.push(format!("component_configs.{name}: {e}"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::validation_error(problems.join("; ")))
        }
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            max_circuit_breakers: 50,
            default_config: ComponentBreakerConfig::default(),
            component_configs: HashMap::new(),
        }
    }
}
