//! Loads the shipped settings files for each environment

mod common;

use atomic_circuit::{CircuitBreakerManager, CircuitState, MockClock, SettingsLoader};
use common::{CallProbe, RecordingCollector};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

fn load(environment: &str) -> atomic_circuit::CircuitBreakerSettings {
    SettingsLoader::new(shipped_config_dir(), environment)
        .without_env_overrides()
        .load()
        .unwrap()
}

#[test]
fn test_development_settings() {
    let settings = load("development");

    assert_eq!(settings.max_circuit_breakers, 50);
    assert_eq!(settings.default_config.failure_threshold, 5);
    assert_eq!(settings.default_config.success_threshold, 2);
    assert_eq!(settings.default_config.reset_timeout_ms, 30_000);

    let queue = settings.config_for_component("queue");
    assert_eq!(queue.failure_threshold, 3);
    assert_eq!(queue.reset_timeout_ms, 15_000);

    let external = settings.config_for_component("external_api");
    assert_eq!(external.reset_timeout_ms, 45_000);
}

#[test]
fn test_production_overrides_merge_with_base() {
    let settings = load("production");

    assert_eq!(settings.max_circuit_breakers, 200);

    let external = settings.config_for_component("external_api");
    assert_eq!(external.failure_threshold, 10);
    assert_eq!(external.reset_timeout_ms, 60_000);
    // Not overridden, so it comes from the base file
    assert_eq!(external.success_threshold, 2);

    assert_eq!(settings.config_for_component("database").reset_timeout_ms, 30_000);
}

#[test]
fn test_test_environment_uses_short_timeouts() {
    let settings = load("test");

    assert_eq!(settings.default_config.failure_threshold, 3);
    assert_eq!(settings.default_config.reset_timeout_ms, 100);
    assert_eq!(settings.config_for_component("external_api").reset_timeout_ms, 100);
    assert_eq!(settings.config_for_component("unlisted").failure_threshold, 3);
}

#[test]
fn test_manager_runs_recovery_cycle_from_loaded_settings() {
    let clock = MockClock::new();
    let collector = Arc::new(RecordingCollector::default());
    let manager = CircuitBreakerManager::with_clock(load("test"), Arc::new(clock.clone()))
        .with_metrics_collector(collector.clone());

    let breaker = manager.get_circuit_breaker("external_api").unwrap();
    let probe = CallProbe::default();

    for _ in 0..3 {
        let _ = breaker.execute(|| probe.fail());
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(manager.get_state_summary().get(&CircuitState::Open), Some(&1));
    assert!(manager.system_health_score() < 1.0);

    clock.advance(Duration::from_millis(100));
    let _ = breaker.execute(|| probe.succeed());
    let _ = breaker.execute(|| probe.succeed());
    assert_eq!(breaker.state(), CircuitState::Closed);

    assert_eq!(collector.count(CircuitState::HalfOpen, CircuitState::Closed), 1);
    assert_eq!(manager.list_components(), vec!["external_api".to_string()]);

    let metrics = manager.get_component_metrics("external_api").unwrap();
    assert_eq!(metrics.total_requests, 5);
    assert!(metrics.is_healthy());
}

#[test]
fn test_missing_environment_file_falls_back_to_base() {
    let settings = load("staging");
    assert_eq!(settings.max_circuit_breakers, 50);
    assert_eq!(settings.default_config.failure_threshold, 5);
}
