//! # Circuit Breaker Manager
//!
//! Owns one circuit breaker per named component. Breakers share the manager's
//! clock and metrics collector but none of their state.

use crate::config::{CircuitBreakerSettings, ComponentBreakerConfig, ConfigResult};
use crate::resilience::{
    CircuitBreaker, CircuitBreakerMetrics, CircuitState, Clock, MetricsCollector,
    SystemCircuitBreakerMetrics, SystemClock,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Manager for multiple circuit breakers across system components
#[derive(Clone)]
pub struct CircuitBreakerManager {
    /// Collection of circuit breakers by component name
    circuit_breakers: Arc<RwLock<HashMap<String, Arc<CircuitBreaker>>>>,

    settings: CircuitBreakerSettings,
    clock: Arc<dyn Clock>,
    collector: Option<Arc<dyn MetricsCollector>>,
}

impl CircuitBreakerManager {
    /// Create new circuit breaker manager from loaded settings
    pub fn from_settings(settings: CircuitBreakerSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: CircuitBreakerSettings, clock: Arc<dyn Clock>) -> Self {
        info!(
            components = settings.component_configs.len(),
            max_circuit_breakers = settings.max_circuit_breakers,
            "Initializing circuit breaker manager"
        );

        Self {
            circuit_breakers: Arc::new(RwLock::new(HashMap::new())),
            settings,
            clock,
            collector: None,
        }
    }

    /// Attach a collector to every breaker created from now on
    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Get or create circuit breaker for a component
    pub fn get_circuit_breaker(&self, component_name: &str) -> ConfigResult<Arc<CircuitBreaker>> {
        if let Some(breaker) = self.circuit_breakers.read().get(component_name) {
            return Ok(Arc::clone(breaker));
        }

        let mut breakers = self.circuit_breakers.write();

        // Double-check pattern (another thread might have created it)
        if let Some(breaker) = breakers.get(component_name) {
            return Ok(Arc::clone(breaker));
        }

        if breakers.len() >= self.settings.max_circuit_breakers {
            warn!(
                component = component_name,
                current_count = breakers.len(),
                max_allowed = self.settings.max_circuit_breakers,
                "Maximum circuit breaker limit reached, creating anyway"
            );
        }

        let component_config = self
            .settings
            .config_for_component(component_name)
            .to_resilience_config();

        let mut breaker =
            CircuitBreaker::with_clock(component_name, component_config, Arc::clone(&self.clock))?;
        if let Some(collector) = &self.collector {
            breaker = breaker.with_metrics_collector(Arc::clone(collector));
        }
        let breaker = Arc::new(breaker);

        breakers.insert(component_name.to_string(), Arc::clone(&breaker));

        info!(
            component = component_name,
            total_circuit_breakers = breakers.len(),
            "Created new circuit breaker"
        );

        Ok(breaker)
    }

    /// Get all circuit breaker names, sorted
    pub fn list_components(&self) -> Vec<String> {
        let mut names: Vec<String> = self.circuit_breakers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Get metrics for a specific circuit breaker
    pub fn get_component_metrics(&self, component_name: &str) -> Option<CircuitBreakerMetrics> {
        self.circuit_breakers
            .read()
            .get(component_name)
            .map(|breaker| breaker.metrics())
    }

    /// Get system-wide circuit breaker metrics
    pub fn get_system_metrics(&self) -> SystemCircuitBreakerMetrics {
        let mut system_metrics = SystemCircuitBreakerMetrics::new();

        for (name, breaker) in self.circuit_breakers.read().iter() {
            system_metrics.add_circuit_breaker(name.clone(), breaker.metrics());
        }

        system_metrics
    }

    /// Force open all circuit breakers (emergency stop)
    pub fn force_open_all(&self) {
        warn!("Forcing all circuit breakers open (emergency stop)");

        for breaker in self.circuit_breakers.read().values() {
            breaker.force_open();
        }
    }

    /// Force close all circuit breakers (emergency recovery)
    pub fn force_close_all(&self) {
        warn!("Forcing all circuit breakers closed (emergency recovery)");

        for breaker in self.circuit_breakers.read().values() {
            breaker.force_closed();
        }
    }

    /// Remove circuit breaker for a component
    pub fn remove_circuit_breaker(&self, component_name: &str) -> bool {
        let mut breakers = self.circuit_breakers.write();
        if breakers.remove(component_name).is_some() {
            info!(
                component = component_name,
                remaining_count = breakers.len(),
                "Removed circuit breaker"
            );
            true
        } else {
            false
        }
    }

    /// Get count of circuit breakers by state
    pub fn get_state_summary(&self) -> HashMap<CircuitState, usize> {
        self.get_system_metrics().count_by_state()
    }

    /// Check overall system health based on circuit breaker states
    pub fn system_health_score(&self) -> f64 {
        self.get_system_metrics().health_score()
    }

    /// Resolved configuration for a component (without creating a breaker)
    pub fn component_config(&self, component_name: &str) -> ComponentBreakerConfig {
        self.settings.config_for_component(component_name)
    }

    pub fn settings(&self) -> &CircuitBreakerSettings {
        &self.settings
    }
}

impl std::fmt::Debug for CircuitBreakerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerManager")
            .field("components", &self.list_components())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
