//! # Circuit Breaker Metrics
//!
//! Point-in-time snapshots of breaker counters, a system-wide aggregate used by
//! the manager, and the [`MetricsCollector`] seam through which transitions and
//! rejections are reported to monitoring.

use crate::logging::log_breaker_transition;
use crate::resilience::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Metrics for a single circuit breaker instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Total number of calls, including rejected ones. Never reset.
    pub total_requests: u64,

    /// Successes since the circuit last closed
    pub success_count: u64,

    /// Failures since the circuit last closed
    pub error_count: u64,

    /// Calls rejected without reaching the operation
    pub rejected_count: u64,

    /// Number of times the circuit has opened
    pub times_opened: u64,

    /// Current circuit breaker state
    pub current_state: CircuitState,

    /// Time since the last state transition
    pub time_in_state: Duration,
}

impl CircuitBreakerMetrics {
    /// Create new metrics instance with zero values
    pub fn new() -> Self {
        Self {
            total_requests: 0,
            success_count: 0,
            error_count: 0,
            rejected_count: 0,
            times_opened: 0,
            current_state: CircuitState::Closed,
            time_in_state: Duration::ZERO,
        }
    }

    /// Open circuits are unhealthy; half-open ones are recovering and admit
    /// traffic. Same rule as `CircuitBreaker::is_healthy`.
    pub fn is_healthy(&self) -> bool {
        !matches!(self.current_state, CircuitState::Open)
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Rejecting all calls",
            CircuitState::HalfOpen => "Recovering - Testing system health",
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "State: {} | Requests: {} | Rejected: {} | Successes: {} | Errors: {} | Opened: {}x | In state: {}ms",
            self.state_description(),
            self.total_requests,
            self.rejected_count,
            self.success_count,
            self.error_count,
            self.times_opened,
            self.time_in_state.as_millis()
        )
    }
}

impl Default for CircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// System-wide circuit breaker metrics aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCircuitBreakerMetrics {
    /// Metrics for individual circuit breakers by name
    pub circuit_breakers: HashMap<String, CircuitBreakerMetrics>,

    /// Timestamp of last metrics collection
    pub collected_at: DateTime<Utc>,
}

impl SystemCircuitBreakerMetrics {
    pub fn new() -> Self {
        Self {
            circuit_breakers: HashMap::new(),
            collected_at: Utc::now(),
        }
    }

    /// Add metrics for a circuit breaker
    pub fn add_circuit_breaker(&mut self, name: String, metrics: CircuitBreakerMetrics) {
        self.circuit_breakers.insert(name, metrics);
        self.collected_at = Utc::now();
    }

    /// Get count of circuit breakers by state
    pub fn count_by_state(&self) -> HashMap<CircuitState, usize> {
        let mut counts = HashMap::new();

        for metrics in self.circuit_breakers.values() {
            *counts.entry(metrics.current_state).or_insert(0) += 1;
        }

        counts
    }

    /// Get list of unhealthy circuit breakers
    pub fn unhealthy_circuits(&self) -> Vec<(&String, &CircuitBreakerMetrics)> {
        self.circuit_breakers
            .iter()
            .filter(|(_, metrics)| !metrics.is_healthy())
            .collect()
    }

    /// Calculate system-wide health score (0.0 to 1.0)
    pub fn health_score(&self) -> f64 {
        if self.circuit_breakers.is_empty() {
            return 1.0;
        }

        let healthy_count = self
            .circuit_breakers
            .values()
            .filter(|metrics| metrics.is_healthy())
            .count();

        healthy_count as f64 / self.circuit_breakers.len() as f64
    }

    /// Total requests across all circuit breakers
    pub fn total_requests(&self) -> u64 {
        self.circuit_breakers
            .values()
            .map(|metrics| metrics.total_requests)
            .sum()
    }

    /// Total rejected calls across all circuit breakers
    pub fn total_rejections(&self) -> u64 {
        self.circuit_breakers
            .values()
            .map(|metrics| metrics.rejected_count)
            .sum()
    }

    /// Format summary for logging
    pub fn format_summary(&self) -> String {
        let state_counts = self.count_by_state();
        let closed_count = state_counts.get(&CircuitState::Closed).unwrap_or(&0);
        let open_count = state_counts.get(&CircuitState::Open).unwrap_or(&0);
        let half_open_count = state_counts.get(&CircuitState::HalfOpen).unwrap_or(&0);

        format!(
            "Circuit Breakers: {} total | {} closed | {} open | {} half-open | Health: {:.1}% | Rejected: {}/{}",
            self.circuit_breakers.len(),
            closed_count,
            open_count,
            half_open_count,
            self.health_score() * 100.0,
            self.total_rejections(),
            self.total_requests()
        )
    }
}

impl Default for SystemCircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives circuit breaker events for monitoring systems.
///
/// Transitions are reported only by the caller that won the transition, so
/// each one is observed exactly once.
pub trait MetricsCollector: Send + Sync {
    /// Record circuit breaker state transition
    fn record_state_transition(&self, name: &str, from: CircuitState, to: CircuitState);

    /// Record a call rejected by an open circuit
    fn record_rejection(&self, name: &str);
}

/// Collector that emits structured log events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMetricsCollector;

impl MetricsCollector for LoggingMetricsCollector {
    fn record_state_transition(&self, name: &str, from: CircuitState, to: CircuitState) {
        log_breaker_transition(name, from, to, None);
    }

    fn record_rejection(&self, name: &str) {
        tracing::trace!(circuit_breaker = name, "Call rejected by open circuit");
    }
}
