//! Settings Loader
//!
//! Environment-aware loading of circuit breaker settings. Sources are layered
//! with the `config` crate, later sources overriding earlier ones:
//!
//! 1. `<dir>/circuit_breaker.toml` (required)
//! 2. `<dir>/circuit_breaker.<environment>.toml` (optional)
//! 3. `ATOMIC_CIRCUIT__*` environment variables, `__` separating nested keys,
//!    e.g. `ATOMIC_CIRCUIT__DEFAULT_CONFIG__FAILURE_THRESHOLD=7`

use super::error::{ConfigResult, ConfigurationError};
use super::CircuitBreakerSettings;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Base name of the settings file inside the config directory
pub const SETTINGS_FILE_STEM: &str = "circuit_breaker";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "ATOMIC_CIRCUIT";

/// Loads and validates [`CircuitBreakerSettings`]
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    config_directory: PathBuf,
    environment: String,
    env_overrides: bool,
}

impl SettingsLoader {
    pub fn new(config_directory: impl Into<PathBuf>, environment: impl Into<String>) -> Self {
        Self {
            config_directory: config_directory.into(),
            environment: environment.into(),
            env_overrides: true,
        }
    }

    /// Directory from `ATOMIC_CIRCUIT_CONFIG_DIR` (default `config`),
    /// environment from [`SettingsLoader::detect_environment`]
    pub fn from_env() -> Self {
        let config_directory = env::var("ATOMIC_CIRCUIT_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));
        Self::new(config_directory, Self::detect_environment())
    }

    /// Skip the environment variable layer
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    /// Current environment name
    pub fn detect_environment() -> String {
        env::var("ATOMIC_CIRCUIT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn base_path(&self) -> PathBuf {
        self.config_directory
            .join(format!("{SETTINGS_FILE_STEM}.toml"))
    }

    pub fn environment_path(&self) -> PathBuf {
        self.config_directory
            .join(format!("{SETTINGS_FILE_STEM}.{}.toml", self.environment))
    }

    /// Load, merge, and validate settings
    pub fn load(&self) -> ConfigResult<CircuitBreakerSettings> {
        let base_path = self.base_path();
        if !base_path.is_file() {
            return Err(ConfigurationError::config_file_not_found(vec![base_path]));
        }

        let environment_path = self.environment_path();
        debug!(
            environment = %self.environment,
            base = %base_path.display(),
            override_file = %environment_path.display(),
            override_present = environment_path.is_file(),
            "Loading circuit breaker settings"
        );

        let mut builder = Config::builder()
            .add_source(File::from(base_path.as_path()).format(FileFormat::Toml))
            .add_source(
                File::from(environment_path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );

        if self.env_overrides {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings: CircuitBreakerSettings = builder
            .build()
            .and_then(|merged| merged.try_deserialize())
            .map_err(|e| ConfigurationError::parse_error(base_path.display().to_string(), e))?;

        settings.validate()?;

        info!(
            environment = %self.environment,
            components = settings.component_configs.len(),
            default_failure_threshold = settings.default_config.failure_threshold,
            "Circuit breaker settings loaded"
        );

        Ok(settings)
    }
}
