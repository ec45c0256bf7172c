//! Shared helpers for circuit breaker integration tests

#![allow(dead_code)]

pub mod strategies;

use atomic_circuit::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, Clock, MetricsCollector, MockClock,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamError(pub &'static str);

impl std::fmt::Display for DownstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "downstream error: {}", self.0)
    }
}

impl std::error::Error for DownstreamError {}

/// Counts how many times a guarded operation actually ran
#[derive(Debug, Default)]
pub struct CallProbe {
    calls: AtomicUsize,
}

impl CallProbe {
    pub fn succeed(&self) -> Result<&'static str, DownstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("ok")
    }

    pub fn fail(&self) -> Result<&'static str, DownstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DownstreamError("connection refused"))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Collector that remembers every transition it is told about
#[derive(Debug, Default)]
pub struct RecordingCollector {
    transitions: Mutex<Vec<(CircuitState, CircuitState)>>,
    rejections: AtomicUsize,
}

impl RecordingCollector {
    pub fn transitions(&self) -> Vec<(CircuitState, CircuitState)> {
        self.transitions.lock().clone()
    }

    pub fn count(&self, from: CircuitState, to: CircuitState) -> usize {
        self.transitions
            .lock()
            .iter()
            .filter(|transition| **transition == (from, to))
            .count()
    }

    pub fn rejections(&self) -> usize {
        self.rejections.load(Ordering::SeqCst)
    }
}

impl MetricsCollector for RecordingCollector {
    fn record_state_transition(&self, _name: &str, from: CircuitState, to: CircuitState) {
        self.transitions.lock().push((from, to));
    }

    fn record_rejection(&self, _name: &str) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }
}

/// Breaker driven by a mock clock, reporting to a recording collector
pub fn instrumented_breaker(
    failure_threshold: u32,
    success_threshold: u32,
    reset_timeout: Duration,
) -> (Arc<CircuitBreaker>, MockClock, Arc<RecordingCollector>) {
    let clock = MockClock::new();
    let collector = Arc::new(RecordingCollector::default());
    let breaker = CircuitBreaker::with_clock(
        "downstream",
        CircuitBreakerConfig::new(failure_threshold, success_threshold, reset_timeout),
        Arc::new(clock.clone()),
    )
    .expect("valid test config")
    .with_metrics_collector(collector.clone());

    (Arc::new(breaker), clock, collector)
}

/// Mock clock that can hold the next `n` readers at a barrier.
///
/// Callers that find an open circuit read the clock before racing for the
/// probe, so arming it for every contending thread lines them all up on the
/// same open period.
#[derive(Debug, Default)]
pub struct RendezvousClock {
    inner: MockClock,
    barrier: Mutex<Option<Arc<Barrier>>>,
    pending: AtomicUsize,
}

impl RendezvousClock {
    pub fn new(inner: MockClock) -> Self {
        Self {
            inner,
            barrier: Mutex::new(None),
            pending: AtomicUsize::new(0),
        }
    }

    /// Block the next `readers` calls to `now()` until all of them arrive
    pub fn arm(&self, readers: usize) {
        *self.barrier.lock() = Some(Arc::new(Barrier::new(readers)));
        self.pending.store(readers, Ordering::SeqCst);
    }
}

impl Clock for RendezvousClock {
    fn now(&self) -> Instant {
        let held = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if held {
            let barrier = self.barrier.lock().clone();
            if let Some(barrier) = barrier {
                barrier.wait();
            }
        }
        self.inner.now()
    }
}
