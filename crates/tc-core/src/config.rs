//! Control-loop configuration.

use crate::{CoreError, CoreResult, RouteId, Step};

/// Top-level configuration for one control-loop run.
///
/// Typically built from `Default` and adjusted field-by-field by the
/// application; validated once when the loop is constructed.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopConfig {
    /// Cooperative pacing delay between engine steps, in milliseconds.
    ///
    /// A throttle, not a correctness requirement: `0` disables pacing
    /// entirely for headless and test runs.  Default: 50.
    pub pace_ms: u64,

    /// Engine steps between successive agent-controller evaluations.
    /// Must be at least 1.  Default: 10.
    pub decision_cadence: u64,

    /// Engine steps between metric samples.  `0` disables sampling.
    /// Default: 50.
    pub sample_interval: u64,

    /// Vehicle class that marks emergency traffic, both for dispatched
    /// vehicles and for preemption detection.  Default: `"emergency"`.
    pub emergency_class: String,

    /// Route on which dispatched emergency vehicles are injected.  Must name
    /// a route in the running scenario.  Default: `"loop"`.
    pub dispatch_route: RouteId,

    /// Position along the accident edge at which the lead vehicle is pinned,
    /// in metres from the edge start.  Default: 250.
    pub accident_position: f64,

    /// How long an accident pins the lead vehicle in place, in simulated
    /// seconds.  Default: 100.
    pub accident_duration: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            pace_ms:           50,
            decision_cadence:  10,
            sample_interval:   50,
            emergency_class:   "emergency".to_owned(),
            dispatch_route:    RouteId::from("loop"),
            accident_position: 250.0,
            accident_duration: 100.0,
        }
    }
}

impl LoopConfig {
    /// Check invariants that the loop relies on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.decision_cadence == 0 {
            return Err(CoreError::Config(
                "decision_cadence must be at least 1".to_owned(),
            ));
        }
        if self.emergency_class.is_empty() {
            return Err(CoreError::Config("emergency_class must be non-empty".to_owned()));
        }
        if self.accident_position < 0.0 {
            return Err(CoreError::Config(
                "accident_position must be non-negative".to_owned(),
            ));
        }
        if self.accident_duration <= 0.0 {
            return Err(CoreError::Config(
                "accident_duration must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// `true` when the agent controllers should run at `step`.
    #[inline]
    pub fn is_decision_step(&self, step: Step) -> bool {
        step.0.is_multiple_of(self.decision_cadence)
    }

    /// `true` when a metrics sample should be taken at `step`.
    #[inline]
    pub fn is_sample_step(&self, step: Step) -> bool {
        self.sample_interval > 0 && step.0.is_multiple_of(self.sample_interval)
    }
}
