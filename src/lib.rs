#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Atomic Circuit
//!
//! Lock-free circuit breaker for guarding calls to unreliable dependencies.
//!
//! ## Overview
//!
//! A [`CircuitBreaker`] wraps a fallible operation, typically a network call.
//! After the operation fails often enough the circuit opens and calls are
//! rejected without reaching the dependency. Once the reset timeout has
//! passed a single caller probes the dependency; enough successful probes
//! close the circuit again.
//!
//! The breaker never retries, never classifies errors and keeps no state
//! beyond the process. Each guarded dependency gets its own instance.
//!
//! ## Module Organization
//!
//! - [`resilience`] - Circuit breaker, clock, metrics and manager
//! - [`config`] - Settings files, environment overrides and validation errors
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use atomic_circuit::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new(
//!     "billing_api",
//!     CircuitBreakerConfig::new(3, 2, Duration::from_millis(100)),
//! )?;
//!
//! for _ in 0..3 {
//!     let _ = breaker.execute(|| Err::<(), _>("connection refused"));
//! }
//! assert_eq!(breaker.state(), CircuitState::Open);
//!
//! let rejected = breaker.execute(|| Ok::<_, &str>("never runs"));
//! assert!(rejected.unwrap_err().is_circuit_open());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod resilience;

pub use config::{
    CircuitBreakerSettings, ComponentBreakerConfig, ConfigResult, ConfigurationError,
    SettingsLoader,
};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerManager,
    CircuitBreakerMetrics, CircuitState, Clock, LoggingMetricsCollector, MetricsCollector,
    MockClock, SystemCircuitBreakerMetrics, SystemClock,
};
