//! # Circuit Breaker Implementation
//!
//! Guards calls to an unreliable dependency with the classic three-state
//! machine: Closed (normal operation), Open (failing fast) and Half-Open
//! (probing recovery).
//!
//! All shared state is held in individually atomic fields and every state
//! transition is a single compare-and-swap on the state field. There is no
//! atomicity across fields: a reader may briefly see `error_count` past the
//! threshold while the state is still Closed.
//!
//! `last_state_change` is written only by the caller that won a transition.
//! The reset timeout is gated on a separate `opened_at` stamp that reads as
//! `NOT_OPEN` until the caller that opened the circuit has written it, so a
//! caller that sees Open before the stamp lands is rejected rather than
//! probing early.
//!
//! ```text
//! Closed   --(error_count >= failure_threshold)-->   Open
//! Open     --(time in state >= reset_timeout)-->     HalfOpen
//! HalfOpen --(any failed probe)-->                   Open
//! HalfOpen --(success_count >= success_threshold)--> Closed
//! ```

use crate::config::ConfigResult;
use crate::resilience::{
    CircuitBreakerConfig, CircuitBreakerMetrics, Clock, MetricsCollector, SystemClock,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// `opened_at` value while no open period is waiting for a probe
const NOT_OPEN: u64 = u64::MAX;

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - calls are allowed through as probes
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Errors returned from a guarded call
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open; the operation was not invoked
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// The operation ran and failed; its error is passed through unchanged
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    /// True when the call was rejected without reaching the operation
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::CircuitOpen { .. })
    }

    pub fn operation_error(&self) -> Option<&E> {
        match self {
            CircuitBreakerError::OperationFailed(err) => Some(err),
            CircuitBreakerError::CircuitOpen { .. } => None,
        }
    }

    pub fn into_operation_error(self) -> Option<E> {
        match self {
            CircuitBreakerError::OperationFailed(err) => Some(err),
            CircuitBreakerError::CircuitOpen { .. } => None,
        }
    }
}

/// Lock-free circuit breaker guarding a single dependency.
///
/// Share between threads or tasks with `Arc<CircuitBreaker>`; every method
/// takes `&self`.
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Current circuit state, only changed through compare-and-swap
    state: AtomicU8,

    /// Configuration parameters (immutable)
    config: CircuitBreakerConfig,

    /// Successes since the circuit last closed or went half-open
    success_count: AtomicU64,

    /// Failures since the circuit last closed
    error_count: AtomicU64,

    /// Lifetime call count, including rejected calls
    request_count: AtomicU64,

    rejected_count: AtomicU64,
    times_opened: AtomicU64,

    /// Nanos since `epoch` of the most recent successful state transition
    last_state_change_nanos: AtomicU64,

    /// Nanos since `epoch` at which the current open period started, or
    /// `NOT_OPEN`. Claimed back to `NOT_OPEN` by the caller that probes.
    opened_at_nanos: AtomicU64,

    /// Construction instant; timestamps are stored relative to it
    epoch: Instant,

    clock: Arc<dyn Clock>,
    collector: Option<Arc<dyn MetricsCollector>>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker driven by the system clock
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a new circuit breaker with an explicit time source
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let name = name.into();

        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            reset_timeout_ms = config.reset_timeout.as_millis() as u64,
            "Circuit breaker initialized"
        );

        let epoch = clock.now();
        Ok(Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            success_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            request_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            times_opened: AtomicU64::new(0),
            last_state_change_nanos: AtomicU64::new(0),
            opened_at_nanos: AtomicU64::new(NOT_OPEN),
            epoch,
            clock,
            collector: None,
        })
    }

    /// Report transitions and rejections to `collector`
    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Run a blocking operation under circuit breaker protection.
    ///
    /// The operation is not invoked when the call is rejected. The calling
    /// thread blocks for as long as the operation does; no timeout is applied.
    pub fn execute<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let effective = self.admit().ok_or_else(|| self.open_error::<E>())?;

        let result = operation();
        self.record_outcome(effective, result.is_ok());

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Run an async operation under circuit breaker protection.
    ///
    /// Same contract as [`CircuitBreaker::execute`]. If the returned future is
    /// dropped before the operation resolves, the call stays counted but no
    /// outcome is recorded.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let effective = self.admit().ok_or_else(|| self.open_error::<E>())?;

        let result = operation().await;
        self.record_outcome(effective, result.is_ok());

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Count the call and decide the state it runs under.
    ///
    /// Returns `None` when the call must be rejected.
    fn admit(&self) -> Option<CircuitState> {
        self.request_count.fetch_add(1, Ordering::AcqRel);

        match self.state() {
            CircuitState::Closed => Some(CircuitState::Closed),
            CircuitState::HalfOpen => Some(CircuitState::HalfOpen),
            CircuitState::Open => self.admit_from_open(),
        }
    }

    /// Admission for a caller that observed the Open state.
    ///
    /// Once the reset timeout has elapsed, callers race to swap the open
    /// stamp back to `NOT_OPEN`; only that winner performs the
    /// Open -> HalfOpen transition and runs the probe. Callers still inside
    /// the reset timeout, callers that see the stamp unwritten, and callers
    /// that lost either swap are rejected.
    fn admit_from_open(&self) -> Option<CircuitState> {
        let opened_at = self.opened_at_nanos.load(Ordering::Acquire);

        if opened_at != NOT_OPEN
            && self.elapsed_since(opened_at) >= self.config.reset_timeout
            && self
                .opened_at_nanos
                .compare_exchange(opened_at, NOT_OPEN, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            && self.try_transition(CircuitState::Open, CircuitState::HalfOpen)
        {
            return Some(CircuitState::HalfOpen);
        }

        self.reject();
        None
    }

    fn reject(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
        if let Some(collector) = &self.collector {
            collector.record_rejection(&self.name);
        }
    }

    /// Apply the outcome of an operation admitted under `effective`
    fn record_outcome(&self, effective: CircuitState, succeeded: bool) {
        match (effective, succeeded) {
            (CircuitState::Closed, true) => {
                // Informational only while closed
                self.success_count.fetch_add(1, Ordering::AcqRel);
            }
            (CircuitState::Closed, false) => {
                let errors = self.error_count.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(
                    component = %self.name,
                    error_count = errors,
                    failure_threshold = self.config.failure_threshold,
                    "Operation failed"
                );
                if errors >= u64::from(self.config.failure_threshold) {
                    self.try_transition(CircuitState::Closed, CircuitState::Open);
                }
            }
            (CircuitState::HalfOpen, true) => {
                let successes = self.success_count.fetch_add(1, Ordering::AcqRel) + 1;
                debug!(
                    component = %self.name,
                    success_count = successes,
                    success_threshold = self.config.success_threshold,
                    "Probe succeeded"
                );
                if successes >= u64::from(self.config.success_threshold) {
                    self.try_transition(CircuitState::HalfOpen, CircuitState::Closed);
                }
            }
            (CircuitState::HalfOpen, false) => {
                self.error_count.fetch_add(1, Ordering::AcqRel);
                self.try_transition(CircuitState::HalfOpen, CircuitState::Open);
            }
            (CircuitState::Open, _) => {
                // admit() never runs an operation under Open
            }
        }
    }

    /// Attempt `from -> to` with a single compare-and-swap.
    ///
    /// Only the winner stamps the transition and runs the entry bookkeeping.
    /// A loser changes nothing and keeps acting under the state it read.
    fn try_transition(&self, from: CircuitState, to: CircuitState) -> bool {
        match self.state.compare_exchange(
            from as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.mark_state_change(to);
                self.on_enter(from, to);
                true
            }
            Err(actual) => {
                debug!(
                    component = %self.name,
                    from = %from,
                    to = %to,
                    actual = %CircuitState::from(actual),
                    "State transition lost to a concurrent caller"
                );
                false
            }
        }
    }

    /// Entry bookkeeping, run once per transition by whoever performed it
    fn on_enter(&self, from: CircuitState, to: CircuitState) {
        match to {
            CircuitState::Closed => {
                self.error_count.store(0, Ordering::Release);
                self.success_count.store(0, Ordering::Release);

                info!(
                    component = %self.name,
                    from = %from,
                    total_requests = self.request_count(),
                    "Circuit breaker closed (recovered)"
                );
            }
            CircuitState::Open => {
                self.times_opened.fetch_add(1, Ordering::AcqRel);

                warn!(
                    component = %self.name,
                    from = %from,
                    error_count = self.error_count(),
                    failure_threshold = self.config.failure_threshold,
                    reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                    "Circuit breaker opened (failing fast)"
                );
            }
            CircuitState::HalfOpen => {
                self.success_count.store(0, Ordering::Release);

                info!(
                    component = %self.name,
                    success_threshold = self.config.success_threshold,
                    "Circuit breaker half-open (testing recovery)"
                );
            }
        }

        if let Some(collector) = &self.collector {
            collector.record_state_transition(&self.name, from, to);
        }
    }

    /// Force circuit to open state. Restarts the reset timeout.
    ///
    /// Not ordered against transitions made by in-flight calls.
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");

        self.mark_state_change(CircuitState::Open);
        let previous = CircuitState::from(
            self.state
                .swap(CircuitState::Open as u8, Ordering::AcqRel),
        );
        if previous != CircuitState::Open {
            self.on_enter(previous, CircuitState::Open);
        }
    }

    /// Force circuit to closed state, resetting success and error counts
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");

        self.opened_at_nanos.store(NOT_OPEN, Ordering::Release);
        let previous = CircuitState::from(
            self.state
                .swap(CircuitState::Closed as u8, Ordering::AcqRel),
        );
        if previous != CircuitState::Closed {
            self.mark_state_change(CircuitState::Closed);
            self.on_enter(previous, CircuitState::Closed);
        }
    }

    fn open_error<E>(&self) -> CircuitBreakerError<E> {
        CircuitBreakerError::CircuitOpen {
            component: self.name.clone(),
        }
    }

    fn nanos_since_epoch(&self) -> u64 {
        self.clock
            .now()
            .saturating_duration_since(self.epoch)
            .as_nanos() as u64
    }

    fn elapsed_since(&self, nanos: u64) -> Duration {
        Duration::from_nanos(self.nanos_since_epoch().saturating_sub(nanos))
    }

    /// Stamp a transition into `to`; entering Open also arms the reset timeout
    fn mark_state_change(&self, to: CircuitState) {
        let now = self.nanos_since_epoch();
        if to == CircuitState::Open {
            self.opened_at_nanos.store(now, Ordering::Release);
        }
        self.last_state_change_nanos.store(now, Ordering::Release);
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Acquire)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Acquire)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Acquire)
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Acquire)
    }

    pub fn times_opened(&self) -> u64 {
        self.times_opened.load(Ordering::Acquire)
    }

    /// Instant of the most recent state transition
    pub fn last_state_change(&self) -> Instant {
        self.epoch + Duration::from_nanos(self.last_state_change_nanos.load(Ordering::Acquire))
    }

    /// Time elapsed since the most recent state transition
    pub fn time_in_state(&self) -> Duration {
        self.elapsed_since(self.last_state_change_nanos.load(Ordering::Acquire))
    }

    /// Anything but an open circuit is healthy; half-open circuits are
    /// recovering and admit traffic. Agrees with
    /// [`CircuitBreakerMetrics::is_healthy`].
    pub fn is_healthy(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            total_requests: self.request_count(),
            success_count: self.success_count(),
            error_count: self.error_count(),
            rejected_count: self.rejected_count(),
            times_opened: self.times_opened(),
            current_state: self.state(),
            time_in_state: self.time_in_state(),
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("config", &self.config)
            .field("success_count", &self.success_count())
            .field("error_count", &self.error_count())
            .field("request_count", &self.request_count())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
