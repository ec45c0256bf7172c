//! Environment variable overrides.
//!
//! Kept in its own test binary: it mutates the process environment, which
//! would race with loaders in other tests.

use atomic_circuit::SettingsLoader;
use std::path::PathBuf;

#[test]
fn test_env_vars_override_settings_files() {
    let config_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");
    let threshold_var = "ATOMIC_CIRCUIT__DEFAULT_CONFIG__FAILURE_THRESHOLD";
    let timeout_var = "ATOMIC_CIRCUIT__COMPONENT_CONFIGS__QUEUE__RESET_TIMEOUT_MS";

    std::env::set_var(threshold_var, "9");
    std::env::set_var(timeout_var, "2500");

    let loaded = SettingsLoader::new(&config_dir, "production").load();
    let ignored = SettingsLoader::new(&config_dir, "production")
        .without_env_overrides()
        .load();

    std::env::remove_var(threshold_var);
    std::env::remove_var(timeout_var);

    let settings = loaded.unwrap();
    assert_eq!(settings.default_config.failure_threshold, 9);
    assert_eq!(settings.config_for_component("queue").reset_timeout_ms, 2_500);
    assert_eq!(settings.config_for_component("queue").failure_threshold, 3);
    // Files still apply underneath the overrides
    assert_eq!(settings.max_circuit_breakers, 200);

    let settings = ignored.unwrap();
    assert_eq!(settings.default_config.failure_threshold, 5);
    assert_eq!(settings.config_for_component("queue").reset_timeout_ms, 15_000);

    std::env::set_var(threshold_var, "0");
    let rejected = SettingsLoader::new(&config_dir, "production").load();
    std::env::remove_var(threshold_var);
    assert!(rejected.is_err());
}
