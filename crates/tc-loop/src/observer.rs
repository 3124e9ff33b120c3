//! Observer hooks for loop progress, command outcomes, and metric samples.

use std::fmt;

use tc_command::Command;
use tc_core::{LaneId, Step, TlsId};
use tc_engine::EngineError;

use crate::RunOutcome;

// ── Sample payload ────────────────────────────────────────────────────────────

/// Aggregate statistics read from the engine at one sample tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSample {
    /// The step at which the sample was taken.
    pub step: Step,

    /// Mean speed over all vehicles in the scenario, m/s.
    pub average_speed: f64,

    /// Total CO2 output across all controlled lanes of all agents, mg/s.
    pub co2_mg_s: f64,
}

// ── Command drop reasons ──────────────────────────────────────────────────────

/// Why a command was dropped without effect.
#[derive(Debug)]
pub enum DropReason {
    /// An `Accident` targeted an edge with no vehicle on it.
    EmptyEdge,

    /// The command named a scenario entity that does not exist.
    UnknownEntity(EngineError),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEdge => f.write_str("no vehicle on the target edge"),
            Self::UnknownEntity(e) => write!(f, "{e}"),
        }
    }
}

// ── Observer trait ────────────────────────────────────────────────────────────

/// Callbacks invoked by [`ControlLoop::run`][crate::ControlLoop::run] at key
/// points in the loop body.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Callbacks are infallible by design;
/// observers that can fail internally (file writers, …) stash their first
/// error and expose it after the run.
///
/// # Example — preemption logger
///
/// ```rust,ignore
/// struct PreemptionLogger;
///
/// impl ControlObserver for PreemptionLogger {
///     fn on_preemption(&mut self, step: Step, tls: &TlsId, lane: &LaneId) {
///         println!("{step}: {tls} ceding to emergency corridor on {lane}");
///     }
/// }
/// ```
pub trait ControlObserver {
    /// Called after each successful engine step, before anything else
    /// happens at that step.
    fn on_step(&mut self, _step: Step) {}

    /// Called when a drained command has been applied to the engine.
    fn on_command_applied(&mut self, _step: Step, _cmd: &Command) {}

    /// Called when a drained command was dropped without effect.
    fn on_command_dropped(&mut self, _step: Step, _cmd: &Command, _reason: &DropReason) {}

    /// Called when an agent ceded its decision tick to an emergency corridor.
    fn on_preemption(&mut self, _step: Step, _tls: &TlsId, _lane: &LaneId) {}

    /// Called when a phase extension was applied to `tls`.
    fn on_phase_extended(&mut self, _step: Step, _tls: &TlsId, _seconds: f64) {}

    /// Called at sample ticks with freshly-read aggregate statistics.
    fn on_sample(&mut self, _sample: &TrafficSample) {}

    /// Called once when the run completes normally.  Not called on failure.
    fn on_run_end(&mut self, _outcome: &RunOutcome) {}
}

/// A [`ControlObserver`] that does nothing.  Use when you need to call `run`
/// but don't want progress callbacks.
pub struct NoopObserver;

impl ControlObserver for NoopObserver {}
