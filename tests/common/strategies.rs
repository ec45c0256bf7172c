use proptest::prelude::*;
use std::time::Duration;

/// One step of traffic against a breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Fail,
    /// Move the mock clock forward by this many milliseconds
    Advance(u64),
}

/// Strategy for thresholds small enough to be crossed within a short run
pub fn threshold_strategy() -> impl Strategy<Value = u32> {
    1u32..6
}

/// Strategy for reset timeouts, including zero
pub fn reset_timeout_strategy() -> impl Strategy<Value = Duration> {
    prop_oneof![
        Just(Duration::ZERO),
        (1u64..200).prop_map(Duration::from_millis),
    ]
}

/// Strategy for a single traffic step, weighted toward calls
pub fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Succeed),
        4 => Just(Step::Fail),
        2 => (0u64..250).prop_map(Step::Advance),
    ]
}

/// Strategy for a run of traffic steps
pub fn steps_strategy() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(step_strategy(), 0..120)
}
