//! # Resilience Module
//!
//! Circuit breakers that isolate failing dependencies so callers fail fast
//! instead of piling onto a service that is already struggling.
//!
//! ## Architecture
//!
//! - **Circuit Breakers**: lock-free state machine guarding one dependency
//! - **Clock**: injectable time source for the recovery timeout
//! - **Metrics Collection**: snapshots and transition reporting
//! - **Manager**: one independent breaker per named component
//!
//! ## Usage
//!
//! ```rust,no_run
//! use atomic_circuit::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CircuitBreakerConfig::new(5, 2, Duration::from_secs(30));
//! let circuit_breaker = CircuitBreaker::new("inventory_api", config)?;
//!
//! let result = circuit_breaker.execute(|| {
//!     // Network call here
//!     Ok::<&str, std::io::Error>("success")
//! });
//!
//! match result {
//!     Ok(body) => println!("got {body}"),
//!     Err(e) if e.is_circuit_open() => println!("dependency cooling down, try later"),
//!     Err(e) => println!("call failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod clock;
pub mod config;
pub mod manager;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::CircuitBreakerConfig;
pub use manager::CircuitBreakerManager;
pub use metrics::{
    CircuitBreakerMetrics, LoggingMetricsCollector, MetricsCollector, SystemCircuitBreakerMetrics,
};
